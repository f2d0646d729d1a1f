//! Waveform trace.
//!
//! Records every committed change of every signal so that tests and the CLI
//! can inspect exactly what was driven, and when.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// A single committed value change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// Simulated time in steps.
    pub time: u64,
    /// Clock cycle the change was committed in.
    pub cycle: u64,
    /// Physical signal name.
    pub signal: String,
    /// New sampled value.
    pub value: u64,
}

/// Ordered list of value changes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Trace {
    /// Simulated time steps per clock cycle.
    pub period_steps: u64,
    /// Changes in commit order.
    pub changes: Vec<Change>,
}

impl Trace {
    /// Creates an empty trace.
    pub fn new(period_steps: u64) -> Self {
        Self {
            period_steps,
            changes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, cycle: u64, signal: &str, value: u64) {
        self.changes.push(Change {
            time: cycle * self.period_steps,
            cycle,
            signal: signal.to_string(),
            value,
        });
    }

    /// Changes of one signal, in order.
    pub fn changes<'a>(&'a self, signal: &'a str) -> impl Iterator<Item = &'a Change> + 'a {
        self.changes.iter().filter(move |c| c.signal == signal)
    }

    /// Successive values taken by one signal.
    pub fn values(&self, signal: &str) -> Vec<u64> {
        self.changes(signal).map(|c| c.value).collect()
    }

    /// Serialises the trace as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the JSON form of the trace to `path`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::from)?;
        fs::write(path, json)
    }
}
