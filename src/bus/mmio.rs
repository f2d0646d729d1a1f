//! Register Transaction Engine.
//!
//! Performs single-word reads and writes over a memory-mapped register
//! interface, one address/data/response handshake sequence per word. Wider
//! reads and byte-block writes are composed from single-word transactions.
//!
//! Every argument is validated before the engine waits on reset or drives a
//! line, so a rejected call has no effect on the bus.

use super::handshake::wait_for_high;
use super::interface::AxiLiteBus;
use super::reset::ResetSequencer;
use super::response::{response_name, ResponsePolicy};
use crate::common::{check_aligned, decompose_words, BusError, ReadLength, WordOrder, WriteData};
use crate::kernel::{Signal, SimHandle};
use crate::stats::{BusStats, SharedStats};

/// Full byte strobe for a 32-bit data bus.
const FULL_STROBE: u64 = 0xF;

/// Checks that every word address of an access starting at `offset` fits
/// `line` without wrapping or truncation.
fn check_span(line: &Signal, offset: u64, words: usize) -> Result<(), BusError> {
    let width = line.width();
    let err = || BusError::AddressRange {
        offset,
        words,
        width,
    };
    let last = (words.saturating_sub(1) as u64)
        .checked_mul(4)
        .and_then(|span| offset.checked_add(span))
        .ok_or_else(err)?;
    if width < 64 && last >> width != 0 {
        return Err(err());
    }
    Ok(())
}

/// Register access to one memory-mapped peripheral.
///
/// Reads and writes use disjoint lines, so one read and one write may be in
/// flight at the same time. Two concurrent reads (or two concurrent writes)
/// on the same engine are not supported.
pub struct Mmio {
    sim: SimHandle,
    bus: AxiLiteBus,
    reset: ResetSequencer,
    base_addr: u64,
    length: u64,
    policy: ResponsePolicy,
    stats: SharedStats,
}

impl Mmio {
    /// Creates an engine over `bus` and drives its master-side lines idle.
    ///
    /// # Arguments
    ///
    /// * `sim` - Kernel handle.
    /// * `bus` - The bound register interface.
    /// * `reset` - Sequencer whose ready gate every call waits on.
    pub fn new(sim: SimHandle, bus: AxiLiteBus, reset: ResetSequencer) -> Self {
        bus.arvalid.set(0);
        bus.awvalid.set(0);
        bus.bready.set(0);
        bus.rready.set(0);
        bus.wvalid.set(0);
        Self {
            sim,
            bus,
            reset,
            base_addr: 0,
            length: 4,
            policy: ResponsePolicy::default(),
            stats: BusStats::shared(),
        }
    }

    /// Records the address window this engine was mapped at.
    pub fn with_range(mut self, base_addr: u64, length: u64) -> Self {
        self.base_addr = base_addr;
        self.length = length;
        self
    }

    /// Selects which response codes are reported.
    pub fn with_policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares a statistics block with other engines.
    pub fn with_stats(mut self, stats: SharedStats) -> Self {
        self.stats = stats;
        self
    }

    /// Base address of the mapped window.
    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    /// Size of the mapped window in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The bound register interface.
    pub fn bus(&self) -> &AxiLiteBus {
        &self.bus
    }

    /// Reads `length` bytes at `offset`.
    ///
    /// Reads of 1, 2 and 4 bytes issue one word transaction and mask the
    /// result. An 8-byte read issues transactions at `offset` and
    /// `offset + 4` and combines them according to `word_order`.
    ///
    /// # Errors
    ///
    /// * [`BusError::UnsupportedSize`] if `length` is not 1, 2, 4 or 8.
    /// * [`BusError::Alignment`] if `offset` is not a multiple of 4.
    /// * [`BusError::AddressRange`] if a word address does not fit `ARADDR`.
    pub async fn read(
        &self,
        offset: u64,
        length: usize,
        word_order: WordOrder,
    ) -> Result<u64, BusError> {
        let length = ReadLength::try_from(length)?;
        check_aligned("offset", offset)?;
        let words = if length == ReadLength::Double { 2 } else { 1 };
        check_span(&self.bus.araddr, offset, words)?;
        self.reset.await_ready().await;

        let first = self.single_read(offset).await;
        match length {
            ReadLength::Double => {
                let second = self.single_read(offset + 4).await;
                Ok(word_order.combine(first, second))
            }
            narrow => Ok(first as u64 & narrow.mask()),
        }
    }

    /// Reads the 32-bit word at `offset`.
    pub async fn read_word(&self, offset: u64) -> Result<u32, BusError> {
        Ok(self.read(offset, 4, WordOrder::Little).await? as u32)
    }

    /// Writes `data` at `offset`.
    ///
    /// A single word is written in one transaction. A byte block is split
    /// into little-endian words and word `i` is written at `offset + 4*i`.
    ///
    /// # Errors
    ///
    /// * [`BusError::Alignment`] if `offset` or the byte block length is not
    ///   a multiple of 4.
    /// * [`BusError::AddressRange`] if a word address does not fit `AWADDR`.
    pub async fn write(&self, offset: u64, data: impl Into<WriteData>) -> Result<(), BusError> {
        check_aligned("offset", offset)?;
        let words = match data.into() {
            WriteData::Word(word) => vec![word],
            WriteData::Bytes(bytes) => decompose_words(&bytes)?,
        };
        check_span(&self.bus.awaddr, offset, words.len())?;
        self.reset.await_ready().await;

        for (i, word) in words.into_iter().enumerate() {
            self.single_write(offset + 4 * i as u64, word).await;
        }
        Ok(())
    }

    /// One write transaction: address phase, data phase, response phase.
    async fn single_write(&self, offset: u64, word: u32) {
        let bus = &self.bus;
        log::debug!("{}: write {:#010x} @ {:#x}", bus.name, word, offset);

        bus.awaddr.set(offset);
        bus.awvalid.set(1);
        let mut stalls = wait_for_high(&self.sim, &bus.awready).await;
        self.sim.next_edge().await;
        bus.awvalid.set(0);

        bus.wvalid.set(1);
        bus.wdata.set(word as u64);
        bus.wstrb.set(FULL_STROBE);
        stalls += wait_for_high(&self.sim, &bus.wready).await;
        self.sim.next_edge().await;
        bus.wvalid.set(0);
        bus.wstrb.set(0);

        bus.bready.set(1);
        stalls += wait_for_high(&self.sim, &bus.bvalid).await;
        let resp = bus.bresp.get();
        self.sim.next_edge().await;
        bus.bready.set(0);

        let mut stats = self.stats.borrow_mut();
        stats.register_writes += 1;
        stats.handshake_stalls += stalls;
        drop(stats);
        self.report("write", offset, resp);
    }

    /// One read transaction: address phase, then data/response phase.
    async fn single_read(&self, offset: u64) -> u32 {
        let bus = &self.bus;

        bus.araddr.set(offset);
        bus.arvalid.set(1);
        let mut stalls = wait_for_high(&self.sim, &bus.arready).await;
        self.sim.next_edge().await;
        bus.arvalid.set(0);

        bus.rready.set(1);
        stalls += wait_for_high(&self.sim, &bus.rvalid).await;
        let data = bus.rdata.get() as u32;
        let resp = bus.rresp.get();
        self.sim.next_edge().await;
        bus.rready.set(0);

        log::debug!("{}: read {:#010x} @ {:#x}", bus.name, data, offset);
        let mut stats = self.stats.borrow_mut();
        stats.register_reads += 1;
        stats.handshake_stalls += stalls;
        drop(stats);
        self.report("read", offset, resp);
        data
    }

    fn report(&self, kind: &str, offset: u64, resp: u64) {
        if self.policy.is_notable(resp) {
            log::warn!(
                "{}: {} @ {:#x} completed with response {} ({:#04b})",
                self.bus.name,
                kind,
                offset,
                response_name(resp),
                resp
            );
            self.stats.borrow_mut().notable_responses += 1;
        }
    }
}
