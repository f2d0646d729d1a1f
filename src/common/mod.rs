//! Common types shared by the bus engines, the simulation kernel and the
//! reference peripherals.
//!
//! This module provides the error enums, the word-level data types used by
//! register and stream transfers, and the helpers that validate offsets and
//! decompose byte blocks into bus words.

/// Register access and transfer data types.
pub mod data;

/// Error types for binding, bus calls and simulation runs.
pub mod error;

pub use data::{check_aligned, decompose_words, ReadLength, WordOrder, WriteData, WORD_BYTES};
pub use error::{BindError, BusError, SimError};
