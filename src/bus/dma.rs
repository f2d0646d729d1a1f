//! Stream Transfer Channels.
//!
//! A channel moves a range of buffer words over one streaming interface,
//! one valid/ready handshake per word. A transmit channel drives `TVALID`,
//! `TDATA` and `TLAST`; a receive channel drives `TREADY` and stores words
//! until its buffer range is full or `TLAST` is observed.
//!
//! `transfer` validates the request and launches the handshake loop as an
//! independent concurrent operation; `wait` suspends until that loop has
//! finished. Every `transfer` must be paired with exactly one `wait` before
//! the channel accepts another.

use super::buffer::DmaBuffer;
use super::handshake::wait_for_high;
use super::interface::AxiStreamBus;
use super::reset::ResetSequencer;
use crate::common::{check_aligned, BusError, WORD_BYTES};
use crate::kernel::{Event, SimHandle};
use crate::stats::{BusStats, SharedStats};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Direction of a stream channel, seen from memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Memory to stream: the channel drives data into the design.
    Transmit,
    /// Stream to memory: the channel collects data from the design.
    Receive,
}

impl Direction {
    /// Short channel name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Transmit => "send",
            Direction::Receive => "recv",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lifecycle of the transfer owned by a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No transfer; `transfer` may launch one.
    Idle,
    /// The handshake loop is running.
    Busy,
    /// The loop finished but no `wait` has collected it yet.
    Complete,
}

/// Busy/completion tracking for one channel.
///
/// `launch` moves `Idle -> Busy` and fails otherwise; `complete` moves
/// `Busy -> Complete` and raises the completion event; `collect` waits for
/// the event and moves back to `Idle`.
pub struct ChannelSession {
    state: Cell<SessionState>,
    completion: Event,
}

impl Default for ChannelSession {
    fn default() -> Self {
        Self {
            state: Cell::new(SessionState::Idle),
            completion: Event::new(),
        }
    }
}

impl ChannelSession {
    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Returns `true` from launch until the transfer is collected.
    pub fn is_busy(&self) -> bool {
        self.state.get() != SessionState::Idle
    }

    /// Claims the channel for a new transfer.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Concurrency`] if a transfer is in flight or has
    /// not been collected; the existing transfer is left untouched.
    pub fn launch(&self, channel: &'static str) -> Result<(), BusError> {
        if self.is_busy() {
            return Err(BusError::Concurrency(channel));
        }
        self.completion.clear();
        self.state.set(SessionState::Busy);
        Ok(())
    }

    /// Marks the running transfer as finished and releases the waiter.
    pub fn complete(&self) {
        self.state.set(SessionState::Complete);
        self.completion.set();
    }

    /// Suspends until the transfer finishes, then frees the channel.
    ///
    /// With no transfer in flight this waits for the next one to finish.
    pub async fn collect(&self) {
        self.completion.wait().await;
        self.completion.clear();
        self.state.set(SessionState::Idle);
    }
}

struct ChannelInner {
    direction: Direction,
    sim: SimHandle,
    bus: AxiStreamBus,
    reset: ResetSequencer,
    session: ChannelSession,
    stats: SharedStats,
}

/// One direction of a DMA engine, bound to a streaming interface.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct StreamChannel {
    inner: Rc<ChannelInner>,
}

impl StreamChannel {
    /// Creates a channel over `bus` and drives its outgoing handshake line low.
    pub fn new(
        sim: SimHandle,
        bus: AxiStreamBus,
        direction: Direction,
        reset: ResetSequencer,
    ) -> Self {
        Self::with_stats(sim, bus, direction, reset, BusStats::shared())
    }

    /// Like [`StreamChannel::new`], counting traffic into `stats`.
    pub fn with_stats(
        sim: SimHandle,
        bus: AxiStreamBus,
        direction: Direction,
        reset: ResetSequencer,
        stats: SharedStats,
    ) -> Self {
        match direction {
            Direction::Transmit => bus.tvalid.set(0),
            Direction::Receive => bus.tready.set(0),
        }
        Self {
            inner: Rc::new(ChannelInner {
                direction,
                sim,
                bus,
                reset,
                session: ChannelSession::default(),
                stats,
            }),
        }
    }

    /// Direction of the channel.
    pub fn direction(&self) -> Direction {
        self.inner.direction
    }

    /// The bound streaming interface.
    pub fn bus(&self) -> &AxiStreamBus {
        &self.inner.bus
    }

    /// State of the channel's current transfer.
    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Returns `true` from `transfer` until the matching `wait` returns.
    pub fn is_busy(&self) -> bool {
        self.inner.session.is_busy()
    }

    /// Launches a transfer of `nbytes` bytes starting `start` bytes into
    /// `buffer`, and returns immediately.
    ///
    /// An `nbytes` of 0 means the rest of the buffer from `start`.
    ///
    /// # Errors
    ///
    /// * [`BusError::Alignment`] if `start` or `nbytes` is not a multiple of 4.
    /// * [`BusError::OutOfBounds`] if the range does not fit in `buffer`.
    /// * [`BusError::Concurrency`] if the previous transfer was not waited on.
    pub fn transfer(&self, buffer: &DmaBuffer, start: usize, nbytes: usize) -> Result<(), BusError> {
        check_aligned("start", start as u64)?;
        check_aligned("byte count", nbytes as u64)?;
        let capacity = buffer.nbytes();
        let out_of_bounds = |nbytes| BusError::OutOfBounds {
            start,
            nbytes,
            capacity,
        };
        if start > capacity {
            return Err(out_of_bounds(nbytes));
        }
        let nbytes = if nbytes == 0 { capacity - start } else { nbytes };
        if start.checked_add(nbytes).map_or(true, |end| end > capacity) {
            return Err(out_of_bounds(nbytes));
        }
        self.inner.session.launch(self.inner.direction.label())?;

        let first = start / WORD_BYTES;
        let count = nbytes / WORD_BYTES;
        log::debug!(
            "{}: launching {} transfer of {} words",
            self.inner.bus.name,
            self.inner.direction,
            count
        );
        let inner = self.inner.clone();
        let buffer = buffer.clone();
        match self.inner.direction {
            Direction::Transmit => self.inner.sim.spawn(transmit(inner, buffer, first, count)),
            Direction::Receive => self.inner.sim.spawn(receive(inner, buffer, first, count)),
        }
        Ok(())
    }

    /// Suspends until the launched transfer has finished.
    ///
    /// Called with no transfer in flight, this blocks until another transfer
    /// is launched and finishes.
    pub async fn wait(&self) {
        self.inner.session.collect().await;
    }
}

async fn transmit(channel: Rc<ChannelInner>, buffer: DmaBuffer, first: usize, count: usize) {
    channel.reset.await_ready().await;
    let bus = &channel.bus;
    let sim = &channel.sim;
    let mut stalls = 0;

    bus.tvalid.set(1);
    for i in 0..count {
        let word = buffer.get(first + i).unwrap_or(0);
        bus.tdata.set(word as u64);
        bus.tlast.set_bool(i + 1 == count);
        stalls += wait_for_high(sim, &bus.tready).await;
        log::trace!("{}: sent word {} = {:#x}", bus.name, i, word);
        sim.next_edge().await;
    }
    bus.tvalid.set(0);
    drop(buffer);

    let mut stats = channel.stats.borrow_mut();
    stats.transfers_sent += 1;
    stats.words_sent += count as u64;
    stats.handshake_stalls += stalls;
    drop(stats);
    channel.session.complete();
}

async fn receive(channel: Rc<ChannelInner>, buffer: DmaBuffer, first: usize, count: usize) {
    channel.reset.await_ready().await;
    let bus = &channel.bus;
    let sim = &channel.sim;
    let mut stalls = 0;
    let mut received = 0;

    bus.tready.set(1);
    for i in 0..count {
        stalls += wait_for_high(sim, &bus.tvalid).await;
        let last = bus.tlast.is_high();
        let word = bus.tdata.get() as u32;
        buffer.set(first + i, word);
        received += 1;
        log::trace!("{}: received word {} = {:#x}", bus.name, i, word);
        sim.next_edge().await;
        if last {
            break;
        }
    }
    bus.tready.set(0);
    drop(buffer);

    let mut stats = channel.stats.borrow_mut();
    stats.transfers_received += 1;
    stats.words_received += received;
    stats.handshake_stalls += stalls;
    drop(stats);
    channel.session.complete();
}

/// A DMA engine: an optional send channel and an optional receive channel.
#[derive(Clone, Default)]
pub struct Dma {
    /// Memory-to-stream channel, if the engine has one.
    pub send_channel: Option<StreamChannel>,
    /// Stream-to-memory channel, if the engine has one.
    pub recv_channel: Option<StreamChannel>,
}

impl Dma {
    /// The send channel, or an error naming it as missing.
    pub fn send(&self) -> Result<&StreamChannel, BusError> {
        self.send_channel
            .as_ref()
            .ok_or_else(|| BusError::InvalidParameter("DMA has no send channel".to_string()))
    }

    /// The receive channel, or an error naming it as missing.
    pub fn recv(&self) -> Result<&StreamChannel, BusError> {
        self.recv_channel
            .as_ref()
            .ok_or_else(|| BusError::InvalidParameter("DMA has no receive channel".to_string()))
    }
}
