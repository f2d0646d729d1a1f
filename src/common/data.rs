//! Register and Stream Data Types.
//!
//! These types describe the arguments of register reads/writes and stream
//! transfers. Validation happens here, before any bus line is touched.

use super::error::BusError;
use std::fmt;
use std::str::FromStr;

/// Width of one bus word in bytes.
pub const WORD_BYTES: usize = 4;

/// Checks that `value` is a multiple of the bus word size.
///
/// # Arguments
///
/// * `what` - Name of the quantity, used in the error message.
/// * `value` - The offset or length to check.
pub fn check_aligned(what: &'static str, value: u64) -> Result<(), BusError> {
    if value % WORD_BYTES as u64 != 0 {
        return Err(BusError::Alignment { what, value });
    }
    Ok(())
}

/// Splits a byte block into successive little-endian 32-bit words.
///
/// Word `i` is built from bytes `4*i .. 4*i + 4`, so a block written at
/// `offset` lands word `i` at `offset + 4*i`.
///
/// # Errors
///
/// Returns [`BusError::Alignment`] if the block length is not a multiple of 4.
pub fn decompose_words(bytes: &[u8]) -> Result<Vec<u32>, BusError> {
    check_aligned("data length", bytes.len() as u64)?;
    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Placement of the two 32-bit halves of an 8-byte register read.
///
/// This governs only which bus transaction supplies which half; the byte
/// order within each word is unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WordOrder {
    /// The word read at `offset` is the low half.
    #[default]
    Little,
    /// The word read at `offset` is the high half.
    Big,
}

impl WordOrder {
    /// Combines the words read at `offset` (`first`) and `offset + 4` (`second`).
    pub fn combine(self, first: u32, second: u32) -> u64 {
        match self {
            WordOrder::Little => ((second as u64) << 32) | first as u64,
            WordOrder::Big => ((first as u64) << 32) | second as u64,
        }
    }
}

impl FromStr for WordOrder {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" => Ok(WordOrder::Little),
            "big" => Ok(WordOrder::Big),
            other => Err(BusError::InvalidParameter(format!(
                "word order must be \"little\" or \"big\", got \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for WordOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordOrder::Little => write!(f, "little"),
            WordOrder::Big => write!(f, "big"),
        }
    }
}

/// Supported register read widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadLength {
    /// 1 byte, masked from a single word read.
    Byte,
    /// 2 bytes, masked from a single word read.
    Half,
    /// A full 32-bit word.
    Word,
    /// Two sequential word reads combined per [`WordOrder`].
    Double,
}

impl ReadLength {
    /// Number of bytes returned.
    pub fn bytes(self) -> usize {
        match self {
            ReadLength::Byte => 1,
            ReadLength::Half => 2,
            ReadLength::Word => 4,
            ReadLength::Double => 8,
        }
    }

    /// Mask applied to a single-word read result.
    pub fn mask(self) -> u64 {
        match self {
            ReadLength::Double => u64::MAX,
            other => (1u64 << (8 * other.bytes())) - 1,
        }
    }
}

impl TryFrom<usize> for ReadLength {
    type Error = BusError;

    fn try_from(len: usize) -> Result<Self, Self::Error> {
        match len {
            1 => Ok(ReadLength::Byte),
            2 => Ok(ReadLength::Half),
            4 => Ok(ReadLength::Word),
            8 => Ok(ReadLength::Double),
            other => Err(BusError::UnsupportedSize(other)),
        }
    }
}

/// Payload of a register write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteData {
    /// One 32-bit word, written in a single transaction.
    Word(u32),
    /// A raw byte block, written one word-sized transaction per 4 bytes.
    Bytes(Vec<u8>),
}

impl From<u32> for WriteData {
    fn from(word: u32) -> Self {
        WriteData::Word(word)
    }
}

impl From<Vec<u8>> for WriteData {
    fn from(bytes: Vec<u8>) -> Self {
        WriteData::Bytes(bytes)
    }
}

impl From<&[u8]> for WriteData {
    fn from(bytes: &[u8]) -> Self {
        WriteData::Bytes(bytes.to_vec())
    }
}
