//! Error definitions.
//!
//! Every bus-level failure is detected before a signal is driven, so an error
//! returned from a register or stream call never leaves the bus half way
//! through a handshake.

use thiserror::Error;

/// Errors raised synchronously by register and stream operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// An offset, length or byte count that is not a multiple of 4.
    #[error("unaligned {what}: {value:#x} is not a multiple of 4")]
    Alignment {
        /// Which quantity was misaligned (offset, data length, start, byte count).
        what: &'static str,
        /// The offending value.
        value: u64,
    },

    /// Register read of a width other than 1, 2, 4 or 8 bytes.
    #[error("unsupported read size {0}: only 1, 2, 4 and 8-byte reads are supported")]
    UnsupportedSize(usize),

    /// A parameter with an invalid value or type (word order, write data).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A stream transfer was launched while the previous one was not collected.
    #[error("channel {0} is busy: the previous transfer has not been waited on")]
    Concurrency(&'static str),

    /// A register access whose word addresses do not fit the address lines.
    #[error("access of {words} word(s) at {offset:#x} does not fit a {width}-bit address bus")]
    AddressRange {
        /// First byte offset of the access.
        offset: u64,
        /// Number of word transactions in the access.
        words: usize,
        /// Width of the address lines in bits.
        width: u32,
    },

    /// The requested words do not fit the buffer.
    #[error("transfer of {nbytes} bytes at {start:#x} exceeds buffer of {capacity} bytes")]
    OutOfBounds {
        /// Starting byte offset.
        start: usize,
        /// Requested byte count.
        nbytes: usize,
        /// Buffer size in bytes.
        capacity: usize,
    },
}

/// Errors raised while binding logical bus lines to physical signals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The port map has no entry for a line the protocol requires.
    #[error("{interface}: required line {line} is not mapped")]
    MissingLine {
        /// Interface being bound.
        interface: String,
        /// Logical line name (e.g. `AWVALID`).
        line: &'static str,
    },

    /// The port map names a physical signal the simulator does not know.
    #[error("{interface}: line {line} maps to unknown signal '{signal}'")]
    UnknownSignal {
        /// Interface being bound.
        interface: String,
        /// Logical line name.
        line: &'static str,
        /// Physical signal name from the port map.
        signal: String,
    },
}

/// Errors that end a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The watchdog expired before the awaited operation completed.
    #[error("watchdog expired after {cycles} cycles (simulated deadlock?)")]
    Watchdog {
        /// Cycle count at expiry.
        cycles: u64,
    },

    /// Binding the configured interfaces failed.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// A bus call failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The configuration or a script could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A scripted step observed a value other than the expected one.
    #[error("step {step}: expected {expected}, observed {observed}")]
    Mismatch {
        /// Index of the failing step.
        step: usize,
        /// Expected value, formatted.
        expected: String,
        /// Observed value, formatted.
        observed: String,
    },
}
