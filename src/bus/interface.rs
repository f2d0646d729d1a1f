//! Protocol Interface Binding.
//!
//! Discovery hands the engines a port map per bus interface, mapping each
//! logical protocol line (`AWVALID`, `TDATA`, ...) to the physical signal
//! that carries it. Binding resolves every required line once, up front, so
//! a missing line is reported before any transaction is attempted.

use crate::common::BindError;
use crate::kernel::{Signal, SimHandle};
use std::collections::BTreeMap;

/// Logical line name to physical signal name.
pub type PortMap = BTreeMap<String, String>;

/// Builds a port map where every logical line `L` maps to `{prefix}_{L}`.
pub fn prefixed_ports(prefix: &str, lines: &[&str]) -> PortMap {
    lines
        .iter()
        .map(|line| (line.to_string(), format!("{}_{}", prefix, line)))
        .collect()
}

fn resolve(
    sim: &SimHandle,
    interface: &str,
    ports: &PortMap,
    line: &'static str,
) -> Result<Signal, BindError> {
    let physical = ports.get(line).ok_or_else(|| BindError::MissingLine {
        interface: interface.to_string(),
        line,
    })?;
    sim.lookup(physical).ok_or_else(|| BindError::UnknownSignal {
        interface: interface.to_string(),
        line,
        signal: physical.clone(),
    })
}

/// Lines of one memory-mapped register interface.
#[derive(Clone, Debug)]
pub struct AxiLiteBus {
    /// Interface name, used in diagnostics.
    pub name: String,
    /// Write address.
    pub awaddr: Signal,
    /// Write address valid (master).
    pub awvalid: Signal,
    /// Write address ready (slave).
    pub awready: Signal,
    /// Write data.
    pub wdata: Signal,
    /// Write byte strobes.
    pub wstrb: Signal,
    /// Write data valid (master).
    pub wvalid: Signal,
    /// Write data ready (slave).
    pub wready: Signal,
    /// Write response code.
    pub bresp: Signal,
    /// Write response valid (slave).
    pub bvalid: Signal,
    /// Write response ready (master).
    pub bready: Signal,
    /// Read address.
    pub araddr: Signal,
    /// Read address valid (master).
    pub arvalid: Signal,
    /// Read address ready (slave).
    pub arready: Signal,
    /// Read data.
    pub rdata: Signal,
    /// Read response code.
    pub rresp: Signal,
    /// Read data valid (slave).
    pub rvalid: Signal,
    /// Read data ready (master).
    pub rready: Signal,
}

impl AxiLiteBus {
    /// Logical lines a register interface must map.
    pub const LINES: [&'static str; 17] = [
        "AWADDR", "AWVALID", "AWREADY", "WDATA", "WSTRB", "WVALID", "WREADY", "BRESP", "BVALID",
        "BREADY", "ARADDR", "ARVALID", "ARREADY", "RDATA", "RRESP", "RVALID", "RREADY",
    ];

    /// Resolves every register-interface line through `ports`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] naming the first line that is unmapped or maps
    /// to an unknown signal.
    pub fn bind(sim: &SimHandle, name: &str, ports: &PortMap) -> Result<Self, BindError> {
        let line = |l: &'static str| resolve(sim, name, ports, l);
        Ok(Self {
            name: name.to_string(),
            awaddr: line("AWADDR")?,
            awvalid: line("AWVALID")?,
            awready: line("AWREADY")?,
            wdata: line("WDATA")?,
            wstrb: line("WSTRB")?,
            wvalid: line("WVALID")?,
            wready: line("WREADY")?,
            bresp: line("BRESP")?,
            bvalid: line("BVALID")?,
            bready: line("BREADY")?,
            araddr: line("ARADDR")?,
            arvalid: line("ARVALID")?,
            arready: line("ARREADY")?,
            rdata: line("RDATA")?,
            rresp: line("RRESP")?,
            rvalid: line("RVALID")?,
            rready: line("RREADY")?,
        })
    }
}

/// Lines of one streaming interface.
#[derive(Clone, Debug)]
pub struct AxiStreamBus {
    /// Interface name, used in diagnostics.
    pub name: String,
    /// Stream data word.
    pub tdata: Signal,
    /// Data valid (transmitter).
    pub tvalid: Signal,
    /// Ready to accept (receiver).
    pub tready: Signal,
    /// Final word of a packet.
    pub tlast: Signal,
}

impl AxiStreamBus {
    /// Logical lines a stream interface must map.
    pub const LINES: [&'static str; 4] = ["TDATA", "TVALID", "TREADY", "TLAST"];

    /// Resolves every stream-interface line through `ports`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] naming the first line that is unmapped or maps
    /// to an unknown signal.
    pub fn bind(sim: &SimHandle, name: &str, ports: &PortMap) -> Result<Self, BindError> {
        let line = |l: &'static str| resolve(sim, name, ports, l);
        Ok(Self {
            name: name.to_string(),
            tdata: line("TDATA")?,
            tvalid: line("TVALID")?,
            tready: line("TREADY")?,
            tlast: line("TLAST")?,
        })
    }
}
