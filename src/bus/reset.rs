//! Reset Sequencer.
//!
//! Holds the design in reset for a fixed number of cycles at start of day,
//! releases it, and then waits a further number of cycles before opening the
//! device-ready gate. Every bus engine awaits that gate before it drives a
//! transaction, so nothing touches the design while it is still in reset.

use crate::kernel::{Event, Signal, SimHandle};
use std::cell::Cell;
use std::rc::Rc;

/// Default number of cycles reset is held active.
pub const DEFAULT_ASSERT_CYCLES: u64 = 3;

/// Default number of cycles waited after release before the device is ready.
pub const DEFAULT_SETTLE_CYCLES: u64 = 4;

/// Progress of the reset sequence. Advances monotonically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetState {
    /// Reset is (or will be) driven active.
    Asserting,
    /// Reset is released; consumers must still wait.
    Settling,
    /// The device may be accessed. Terminal.
    Ready,
}

struct ResetInner {
    sim: SimHandle,
    rst: Signal,
    active_low: bool,
    started: Cell<bool>,
    state: Cell<ResetState>,
    ready: Event,
}

/// Drives the reset line and gates bus access on its completion.
///
/// Cloning yields another handle to the same sequence.
#[derive(Clone)]
pub struct ResetSequencer {
    inner: Rc<ResetInner>,
}

impl ResetSequencer {
    /// Creates a sequencer for the reset line `rst`.
    ///
    /// # Arguments
    ///
    /// * `sim` - Kernel handle used to count cycles.
    /// * `rst` - The design's reset line.
    /// * `active_low` - `true` if the design is held in reset while `rst` is 0.
    pub fn new(sim: SimHandle, rst: Signal, active_low: bool) -> Self {
        Self {
            inner: Rc::new(ResetInner {
                sim,
                rst,
                active_low,
                started: Cell::new(false),
                state: Cell::new(ResetState::Asserting),
                ready: Event::new(),
            }),
        }
    }

    /// Current state of the sequence.
    pub fn state(&self) -> ResetState {
        self.inner.state.get()
    }

    /// Returns `true` once the device-ready gate is open.
    pub fn is_ready(&self) -> bool {
        self.inner.state.get() == ResetState::Ready
    }

    /// Starts the sequence as a concurrent operation.
    ///
    /// Reset is held active for `assert_cycles` rising edges, released, and
    /// the device becomes ready `settle_cycles` edges later. The sequence runs
    /// at most once per simulation; later calls are ignored.
    pub fn start(&self, assert_cycles: u64, settle_cycles: u64) {
        if self.inner.started.replace(true) {
            log::warn!("reset sequence already started, ignoring restart");
            return;
        }
        let inner = self.inner.clone();
        self.inner.sim.spawn(async move {
            inner.rst.set_bool(!inner.active_low);
            inner.sim.clock_cycles(assert_cycles).await;
            inner.rst.set_bool(inner.active_low);
            inner.state.set(ResetState::Settling);
            log::info!("reset released at cycle {}", inner.sim.cycle());
            inner.sim.clock_cycles(settle_cycles).await;
            inner.state.set(ResetState::Ready);
            log::info!("reset complete at cycle {}", inner.sim.cycle());
            inner.ready.set();
        });
    }

    /// Suspends until the device is ready. Returns at once if it already is.
    pub async fn await_ready(&self) {
        if self.is_ready() {
            return;
        }
        log::debug!("awaiting device reset");
        let start = self.inner.sim.time();
        self.inner.ready.wait().await;
        log::debug!(
            "waited {} time steps for device reset",
            self.inner.sim.time() - start
        );
    }
}
