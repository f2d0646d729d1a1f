//! Polynomial Evaluator Model.
//!
//! A clocked model of a small accelerator with a register-mapped control
//! port and a pair of stream ports. The coefficients `a`, `b` and `c` are
//! loaded through the control port; every word `x` accepted on the input
//! stream produces `a*x*x + b*x + c` (wrapping 32-bit arithmetic) on the
//! output stream, with `TLAST` forwarded from input to output.
//!
//! Register map (byte offsets on the control port):
//!
//! | Offset | Register      |
//! |--------|---------------|
//! | 0x10   | coefficient a |
//! | 0x18   | coefficient b |
//! | 0x20   | coefficient c |
//!
//! The remaining words below [`REGISTER_WINDOW`] are plain scratch
//! registers. Accesses at or above the window complete with SLVERR.

use super::traits::Peripheral;
use crate::bus::interface::{prefixed_ports, AxiLiteBus, AxiStreamBus, PortMap};
use crate::bus::response::{RESP_OKAY, RESP_SLVERR};
use crate::kernel::{Signal, Simulator};
use std::collections::VecDeque;

/// Signal name prefix of the control port.
pub const CONTROL_PREFIX: &str = "s_axi_control";
/// Signal name prefix of the input stream.
pub const INPUT_PREFIX: &str = "in_stream";
/// Signal name prefix of the output stream.
pub const OUTPUT_PREFIX: &str = "out_stream";
/// Name of the reset line.
pub const RESET_SIGNAL: &str = "ap_rst_n";

/// Offset of coefficient `a`.
pub const REG_A: u64 = 0x10;
/// Offset of coefficient `b`.
pub const REG_B: u64 = 0x18;
/// Offset of coefficient `c`.
pub const REG_C: u64 = 0x20;
/// Size of the decoded register window in bytes.
pub const REGISTER_WINDOW: u64 = 0x40;

/// Default depth of the input-to-output FIFO.
pub const DEFAULT_FIFO_DEPTH: usize = 4;

/// Clocked model of the polynomial evaluator.
pub struct PolyEval {
    rst: Signal,
    active_low: bool,
    ctrl: AxiLiteBus,
    input: AxiStreamBus,
    output: AxiStreamBus,
    regs: Vec<u32>,
    depth: usize,
    fifo: VecDeque<(u32, bool)>,
    aw_addr: Option<u64>,
    w_beat: Option<(u32, u64)>,
    b_resp: Option<u64>,
    r_beat: Option<(u32, u64)>,
}

fn lite_port(sim: &mut Simulator, prefix: &str) -> AxiLiteBus {
    let mut line = |name: &str, width: u32| sim.signal(&format!("{}_{}", prefix, name), width);
    AxiLiteBus {
        name: prefix.to_string(),
        awaddr: line("AWADDR", 32),
        awvalid: line("AWVALID", 1),
        awready: line("AWREADY", 1),
        wdata: line("WDATA", 32),
        wstrb: line("WSTRB", 4),
        wvalid: line("WVALID", 1),
        wready: line("WREADY", 1),
        bresp: line("BRESP", 2),
        bvalid: line("BVALID", 1),
        bready: line("BREADY", 1),
        araddr: line("ARADDR", 32),
        arvalid: line("ARVALID", 1),
        arready: line("ARREADY", 1),
        rdata: line("RDATA", 32),
        rresp: line("RRESP", 2),
        rvalid: line("RVALID", 1),
        rready: line("RREADY", 1),
    }
}

fn stream_port(sim: &mut Simulator, prefix: &str) -> AxiStreamBus {
    let mut line = |name: &str, width: u32| sim.signal(&format!("{}_{}", prefix, name), width);
    AxiStreamBus {
        name: prefix.to_string(),
        tdata: line("TDATA", 32),
        tvalid: line("TVALID", 1),
        tready: line("TREADY", 1),
        tlast: line("TLAST", 1),
    }
}

impl PolyEval {
    /// Creates the model and registers its ports with `sim`.
    ///
    /// # Arguments
    ///
    /// * `sim` - Simulator that will own the port signals.
    /// * `active_low` - Reset polarity of [`RESET_SIGNAL`].
    /// * `fifo_depth` - Words buffered between input and output (at least 1).
    pub fn new(sim: &mut Simulator, active_low: bool, fifo_depth: usize) -> Self {
        let rst = sim.signal(RESET_SIGNAL, 1);
        let ctrl = lite_port(sim, CONTROL_PREFIX);
        let input = stream_port(sim, INPUT_PREFIX);
        let output = stream_port(sim, OUTPUT_PREFIX);
        Self {
            rst,
            active_low,
            ctrl,
            input,
            output,
            regs: vec![0; (REGISTER_WINDOW / 4) as usize],
            depth: fifo_depth.max(1),
            fifo: VecDeque::new(),
            aw_addr: None,
            w_beat: None,
            b_resp: None,
            r_beat: None,
        }
    }

    /// Port map of the control interface.
    pub fn control_ports() -> PortMap {
        prefixed_ports(CONTROL_PREFIX, &AxiLiteBus::LINES)
    }

    /// Port map of the input stream.
    pub fn input_ports() -> PortMap {
        prefixed_ports(INPUT_PREFIX, &AxiStreamBus::LINES)
    }

    /// Port map of the output stream.
    pub fn output_ports() -> PortMap {
        prefixed_ports(OUTPUT_PREFIX, &AxiStreamBus::LINES)
    }

    /// Evaluates the polynomial with the currently loaded coefficients.
    pub fn eval(&self, x: u32) -> u32 {
        let coeff = |offset: u64| self.regs[(offset / 4) as usize];
        coeff(REG_A)
            .wrapping_mul(x)
            .wrapping_mul(x)
            .wrapping_add(coeff(REG_B).wrapping_mul(x))
            .wrapping_add(coeff(REG_C))
    }

    fn in_reset(&self) -> bool {
        self.rst.is_high() != self.active_low
    }

    fn store(&mut self, addr: u64, data: u32, strobe: u64) -> u64 {
        if addr >= REGISTER_WINDOW {
            return RESP_SLVERR;
        }
        let slot = &mut self.regs[(addr / 4) as usize];
        let mut bytes = slot.to_le_bytes();
        for (i, byte) in data.to_le_bytes().iter().enumerate() {
            if strobe & (1 << i) != 0 {
                bytes[i] = *byte;
            }
        }
        *slot = u32::from_le_bytes(bytes);
        RESP_OKAY
    }

    fn load(&self, addr: u64) -> (u32, u64) {
        if addr >= REGISTER_WINDOW {
            (0, RESP_SLVERR)
        } else {
            (self.regs[(addr / 4) as usize], RESP_OKAY)
        }
    }

    fn clear(&mut self) {
        self.regs.fill(0);
        self.fifo.clear();
        self.aw_addr = None;
        self.w_beat = None;
        self.b_resp = None;
        self.r_beat = None;
    }

    fn control_edge(&mut self) {
        let c = &self.ctrl;
        let aw_fire = c.awvalid.is_high() && c.awready.is_high();
        let w_fire = c.wvalid.is_high() && c.wready.is_high();
        let b_fire = c.bvalid.is_high() && c.bready.is_high();
        let ar_fire = c.arvalid.is_high() && c.arready.is_high();
        let r_fire = c.rvalid.is_high() && c.rready.is_high();
        let (awaddr, wdata, wstrb, araddr) =
            (c.awaddr.get(), c.wdata.get() as u32, c.wstrb.get(), c.araddr.get());

        if b_fire {
            self.b_resp = None;
        }
        if aw_fire {
            self.aw_addr = Some(awaddr);
        }
        if w_fire {
            self.w_beat = Some((wdata, wstrb));
        }
        if self.b_resp.is_none() {
            if let (Some(addr), Some((data, strobe))) = (self.aw_addr, self.w_beat) {
                self.b_resp = Some(self.store(addr, data, strobe));
                self.aw_addr = None;
                self.w_beat = None;
            }
        }

        if r_fire {
            self.r_beat = None;
        }
        if ar_fire {
            self.r_beat = Some(self.load(araddr));
        }
    }

    fn stream_edge(&mut self) {
        if self.output.tvalid.is_high() && self.output.tready.is_high() {
            self.fifo.pop_front();
        }
        if self.input.tvalid.is_high() && self.input.tready.is_high() {
            let x = self.input.tdata.get() as u32;
            let y = self.eval(x);
            self.fifo.push_back((y, self.input.tlast.is_high()));
        }
    }

    fn drive_outputs(&self, held: bool) {
        let c = &self.ctrl;
        let busy = self.b_resp.is_some();
        c.awready.set_bool(!held && self.aw_addr.is_none() && !busy);
        c.wready.set_bool(!held && self.w_beat.is_none() && !busy);
        c.bvalid.set_bool(busy);
        c.bresp.set(self.b_resp.unwrap_or(RESP_OKAY));
        c.arready.set_bool(!held && self.r_beat.is_none());
        c.rvalid.set_bool(self.r_beat.is_some());
        let (rdata, rresp) = self.r_beat.unwrap_or((0, RESP_OKAY));
        c.rdata.set(rdata as u64);
        c.rresp.set(rresp);

        self.input.tready.set_bool(!held && self.fifo.len() < self.depth);
        match self.fifo.front() {
            Some(&(y, last)) => {
                self.output.tvalid.set(1);
                self.output.tdata.set(y as u64);
                self.output.tlast.set_bool(last);
            }
            None => {
                self.output.tvalid.set(0);
                self.output.tlast.set(0);
            }
        }
    }
}

impl Peripheral for PolyEval {
    fn name(&self) -> &str {
        "poly_eval"
    }

    fn on_edge(&mut self) {
        if self.in_reset() {
            self.clear();
            self.drive_outputs(true);
            return;
        }
        self.control_edge();
        self.stream_edge();
        self.drive_outputs(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_wraps_like_hardware() {
        let mut sim = Simulator::new(1);
        let mut poly = PolyEval::new(&mut sim, true, DEFAULT_FIFO_DEPTH);
        assert_eq!(poly.store(REG_A, 1, 0xF), RESP_OKAY);
        assert_eq!(poly.store(REG_B, 2, 0xF), RESP_OKAY);
        assert_eq!(poly.store(REG_C, 3, 0xF), RESP_OKAY);
        assert_eq!(poly.eval(10), 123);
        assert_eq!(poly.eval(0x1_0000), 0x2_0003);
    }

    #[test]
    fn partial_strobe_keeps_other_bytes() {
        let mut sim = Simulator::new(1);
        let mut poly = PolyEval::new(&mut sim, true, DEFAULT_FIFO_DEPTH);
        poly.store(0x0, 0xAABB_CCDD, 0xF);
        poly.store(0x0, 0x1122_3344, 0b0101);
        assert_eq!(poly.load(0x0), (0xAA22_CC44, RESP_OKAY));
        assert_eq!(poly.store(REGISTER_WINDOW, 1, 0xF), RESP_SLVERR);
    }
}
