//! Signal lines.
//!
//! A `Signal` has two values: the value most recently driven by its owner and
//! the value sampled at the last settle point. Readers only ever see the
//! sampled value, so every reader within one settle point observes the same
//! fully-propagated state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

struct SignalInner {
    name: String,
    width: u32,
    mask: u64,
    driven: Cell<Option<u64>>,
    sampled: Cell<u64>,
}

/// Handle to a named bit-vector line.
///
/// Handles are cheap to clone; every clone refers to the same line. A line is
/// expected to be driven by exactly one component.
#[derive(Clone)]
pub struct Signal {
    inner: Rc<SignalInner>,
}

impl Signal {
    pub(crate) fn new(name: &str, width: u32) -> Self {
        let mask = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        Self {
            inner: Rc::new(SignalInner {
                name: name.to_string(),
                width,
                mask,
                driven: Cell::new(None),
                sampled: Cell::new(0),
            }),
        }
    }

    /// Physical name of the line.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Width of the line in bits.
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Drives `value` (truncated to the line width).
    ///
    /// The value becomes visible to readers at the next settle point.
    pub fn set(&self, value: u64) {
        self.inner.driven.set(Some(value & self.inner.mask));
    }

    /// Drives 1 for `true`, 0 for `false`.
    pub fn set_bool(&self, level: bool) {
        self.set(level as u64);
    }

    /// Value sampled at the last settle point.
    pub fn get(&self) -> u64 {
        self.inner.sampled.get()
    }

    /// `true` if the sampled value is non-zero.
    pub fn is_high(&self) -> bool {
        self.get() != 0
    }

    /// Moves the driven value into the sampled slot.
    ///
    /// Returns the new value if it differs from the previous sample.
    pub(crate) fn commit(&self) -> Option<u64> {
        let next = self.inner.driven.take()?;
        if next == self.inner.sampled.replace(next) {
            None
        } else {
            Some(next)
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.inner.name)
            .field("width", &self.inner.width)
            .field("value", &self.inner.sampled.get())
            .finish()
    }
}
