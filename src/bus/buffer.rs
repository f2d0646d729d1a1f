//! Transfer buffers.

use crate::common::WORD_BYTES;
use std::cell::RefCell;
use std::rc::Rc;

/// A word buffer shared between its owner and a stream channel.
///
/// Cloning yields another handle to the same storage. A channel holds a
/// handle only while its transfer is in flight.
#[derive(Clone, Debug, Default)]
pub struct DmaBuffer {
    words: Rc<RefCell<Vec<u32>>>,
}

impl DmaBuffer {
    /// Allocates a zero-filled buffer of `words` 32-bit words.
    pub fn allocate(words: usize) -> Self {
        Self {
            words: Rc::new(RefCell::new(vec![0; words])),
        }
    }

    /// Creates a buffer holding a copy of `words`.
    pub fn from_words(words: &[u32]) -> Self {
        Self {
            words: Rc::new(RefCell::new(words.to_vec())),
        }
    }

    /// Capacity in words.
    pub fn len(&self) -> usize {
        self.words.borrow().len()
    }

    /// Returns `true` if the buffer holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.borrow().is_empty()
    }

    /// Capacity in bytes.
    pub fn nbytes(&self) -> usize {
        self.len() * WORD_BYTES
    }

    /// Reads word `index`.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.words.borrow().get(index).copied()
    }

    /// Writes word `index`; out-of-range writes are ignored.
    pub fn set(&self, index: usize, value: u32) {
        if let Some(slot) = self.words.borrow_mut().get_mut(index) {
            *slot = value;
        }
    }

    /// Sets every word to `value`.
    pub fn fill(&self, value: u32) {
        self.words.borrow_mut().fill(value);
    }

    /// Copies the contents out.
    pub fn to_vec(&self) -> Vec<u32> {
        self.words.borrow().clone()
    }
}
