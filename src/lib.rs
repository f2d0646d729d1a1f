//! Cycle-Accurate Bus Transaction Engines.
//!
//! This crate drives a clocked hardware design from host code, one clock
//! edge at a time. It implements the master side of a memory-mapped register
//! protocol, memory-to-stream and stream-to-memory transfer channels, and the
//! reset sequence that gates both.
//!
//! # Architecture
//!
//! * **Kernel**: Named signals, a two-phase clock and a cooperative
//!   single-threaded scheduler.
//! * **Bus**: Register engine, stream channels, reset sequencer.
//! * **Devices**: Clocked peripheral models and the bench builder.
//!
//! # Modules
//!
//! * `bus`: Transaction engines and protocol interfaces.
//! * `common`: Shared data types and error handling.
//! * `config`: Configuration loading and parsing.
//! * `kernel`: Signals, clock and scheduler.
//! * `sim`: Scripted bench runs.
//! * `soc`: Device models and bench assembly.
//! * `stats`: Bus activity statistics.

/// Register, stream and reset engines.
///
/// Implements the valid/ready handshakes of both protocols on top of the
/// kernel, gated on the reset sequencer's ready event.
pub mod bus;

/// Shared data types and error handling.
pub mod common;

/// Configuration system for the bench: clock, reset, device and port maps.
///
/// Loads and parses TOML configuration files, filling every missing key
/// with its default.
pub mod config;

/// Simulation kernel: signals, two-phase clock, scheduler and trace.
pub mod kernel;

/// Scripted bench runs.
pub mod sim;

/// Device models and bench assembly.
pub mod soc;

/// Bus activity statistics collection.
pub mod stats;
