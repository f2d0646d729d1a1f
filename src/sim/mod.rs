//! Bench scripting.

/// TOML step scripts and their runner.
pub mod script;

pub use script::{write_data, Outcome, Script, Step};
