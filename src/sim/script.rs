//! Scripted Bench Runs.
//!
//! A script is a TOML list of `[[step]]` tables executed in order against a
//! [`System`]. Three operations are supported:
//!
//! ```toml
//! [[step]]
//! op = "write"
//! offset = 0x10
//! data = 1                 # integer, or an array of byte values
//!
//! [[step]]
//! op = "read"
//! offset = 0x10
//! length = 4               # 1, 2, 4 or 8 (default 4)
//! word_order = "little"    # only used by 8-byte reads
//! expect = 1
//!
//! [[step]]
//! op = "stream"
//! send = [10, 11, 12]
//! receive = 3              # default: as many words as were sent
//! expect = [123, 146, 171]
//! ```

use crate::bus::DmaBuffer;
use crate::common::{BusError, SimError, WordOrder, WriteData};
use crate::soc::poly::{REG_A, REG_B, REG_C};
use crate::soc::System;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// An ordered list of bench steps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

/// One scripted operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    /// Register write of a word or a byte block.
    Write { offset: u64, data: toml::Value },
    /// Register read, optionally checked against `expect`.
    Read {
        offset: u64,
        #[serde(default = "default_length")]
        length: usize,
        #[serde(default = "default_word_order")]
        word_order: String,
        #[serde(default)]
        expect: Option<u64>,
    },
    /// Words pushed through the send channel and collected from the
    /// receive channel.
    Stream {
        send: Vec<u32>,
        #[serde(default)]
        receive: usize,
        #[serde(default)]
        expect: Option<Vec<u32>>,
    },
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Wrote { offset: u64 },
    Read { offset: u64, value: u64 },
    Streamed { received: Vec<u32> },
}

fn default_length() -> usize {
    4
}

fn default_word_order() -> String {
    WordOrder::default().to_string()
}

/// Converts a TOML value into register write data.
///
/// # Errors
///
/// Returns [`BusError::InvalidParameter`] unless `value` is an integer that
/// fits in 32 bits or an array of integers that each fit in a byte.
pub fn write_data(value: &toml::Value) -> Result<WriteData, BusError> {
    match value {
        toml::Value::Integer(word) => u32::try_from(*word)
            .map(WriteData::Word)
            .map_err(|_| BusError::InvalidParameter(format!("{} does not fit in a word", word))),
        toml::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                toml::Value::Integer(b) => u8::try_from(*b).map_err(|_| {
                    BusError::InvalidParameter(format!("{} is not a byte value", b))
                }),
                other => Err(BusError::InvalidParameter(format!(
                    "byte block element must be an integer, got {}",
                    other.type_str()
                ))),
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(WriteData::Bytes),
        other => Err(BusError::InvalidParameter(format!(
            "write data must be an integer or a byte array, got {}",
            other.type_str()
        ))),
    }
}

impl Script {
    /// Parses a script from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        toml::from_str(text).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Reads and parses the script file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// The built-in demonstration: loads the coefficients `a=1, b=2, c=3`,
    /// reads `a` back, then streams `10..=14` through the evaluator.
    pub fn poly_demo() -> Self {
        let write = |offset: u64, word: i64| Step::Write {
            offset,
            data: toml::Value::Integer(word),
        };
        Self {
            steps: vec![
                write(REG_A, 1),
                write(REG_B, 2),
                write(REG_C, 3),
                Step::Read {
                    offset: REG_A,
                    length: 4,
                    word_order: default_word_order(),
                    expect: Some(1),
                },
                Step::Stream {
                    send: (10..15).collect(),
                    receive: 0,
                    expect: Some(vec![123, 146, 171, 198, 227]),
                },
            ],
        }
    }

    /// Executes every step in order against `system`.
    ///
    /// # Returns
    ///
    /// One [`Outcome`] per step.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step: a rejected bus call, a watchdog
    /// expiry, or an observed value that differs from `expect`
    /// ([`SimError::Mismatch`]).
    pub fn run(&self, system: &mut System) -> Result<Vec<Outcome>, SimError> {
        let System { sim, mmio, dma, .. } = system;
        let mut outcomes = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let outcome = match step {
                Step::Write { offset, data } => {
                    let data = write_data(data)?;
                    sim.run_until(mmio.write(*offset, data))??;
                    log::info!("step {}: write @ {:#x} done", index, offset);
                    Outcome::Wrote { offset: *offset }
                }
                Step::Read {
                    offset,
                    length,
                    word_order,
                    expect,
                } => {
                    // Word order only matters for 8-byte reads.
                    let order: WordOrder = if *length == 8 {
                        word_order.parse()?
                    } else {
                        WordOrder::default()
                    };
                    let value = sim.run_until(mmio.read(*offset, *length, order))??;
                    log::info!("step {}: read @ {:#x} = {:#x}", index, offset, value);
                    if let Some(expected) = expect {
                        if *expected != value {
                            return Err(SimError::Mismatch {
                                step: index,
                                expected: format!("{:#x}", expected),
                                observed: format!("{:#x}", value),
                            });
                        }
                    }
                    Outcome::Read {
                        offset: *offset,
                        value,
                    }
                }
                Step::Stream {
                    send,
                    receive,
                    expect,
                } => {
                    let tx = dma.send()?.clone();
                    let rx = dma.recv()?.clone();
                    let count = if *receive == 0 { send.len() } else { *receive };
                    let input = DmaBuffer::from_words(send);
                    let output = DmaBuffer::allocate(count);

                    rx.transfer(&output, 0, 0)?;
                    tx.transfer(&input, 0, 0)?;
                    sim.run_until(async {
                        tx.wait().await;
                        rx.wait().await;
                    })?;

                    let received = output.to_vec();
                    log::info!("step {}: streamed {} words", index, send.len());
                    if let Some(expected) = expect {
                        if *expected != received {
                            return Err(SimError::Mismatch {
                                step: index,
                                expected: format!("{:?}", expected),
                                observed: format!("{:?}", received),
                            });
                        }
                    }
                    Outcome::Streamed { received }
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}
