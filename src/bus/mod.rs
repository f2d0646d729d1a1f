//! Bus transaction engines.
//!
//! This module drives the two on-chip protocols against the simulation
//! kernel: single register reads and writes over the memory-mapped protocol,
//! and word-by-word stream transfers over the streaming protocol. All engines
//! wait for the reset sequencer before touching a line.

/// DMA-style buffers shared between callers and stream channels.
pub mod buffer;

/// Stream transfer channels and the DMA channel pair.
pub mod dma;

/// Valid/ready waiting primitive shared by every engine.
pub mod handshake;

/// Typed protocol interfaces bound from port maps.
pub mod interface;

/// Memory-mapped register transaction engine.
pub mod mmio;

/// Reset sequencing and the device-ready gate.
pub mod reset;

/// Policy deciding which response codes are reported.
pub mod response;

pub use buffer::DmaBuffer;
pub use dma::{ChannelSession, Direction, Dma, SessionState, StreamChannel};
pub use handshake::wait_for_high;
pub use interface::{prefixed_ports, AxiLiteBus, AxiStreamBus, PortMap};
pub use mmio::Mmio;
pub use reset::{ResetSequencer, ResetState};
pub use response::ResponsePolicy;
