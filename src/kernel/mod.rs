//! Clocked Simulation Kernel.
//!
//! This module implements the signal bus the bus engines run against: named
//! signal lines, a free-running clock, and a single-threaded cooperative
//! scheduler. Every cycle is split into two phases:
//!
//! 1. **Edge**: the cycle counter advances, every attached peripheral model
//!    runs its `on_edge` logic against the values sampled at the previous
//!    settle point, and operations awaiting the edge are resumed.
//! 2. **Settle**: every driven value is committed, becoming the sampled
//!    value, and operations awaiting the settle point are resumed.
//!
//! Operations only advance when every runnable task has suspended, so all
//! tasks observe the same phase ordering regardless of spawn order.

/// Named signal lines.
pub mod signal;

/// Waveform trace recording.
pub mod trace;

/// Edge, settle and event futures.
pub mod trigger;

pub use signal::Signal;
pub use trace::{Change, Trace};
pub use trigger::{Event, EventWait, NextEdge, SettlePoint};

use crate::common::SimError;
use crate::soc::Peripheral;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::{waker, ArcWake, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// Default number of simulated time steps per clock cycle.
pub const DEFAULT_PERIOD_STEPS: u64 = 1000;

/// Default watchdog limit, in cycles.
pub const DEFAULT_MAX_CYCLES: u64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Edge,
    Settle,
}

pub(crate) struct Shared {
    period_steps: u64,
    cycle: Cell<u64>,
    settles: Cell<u64>,
    phase: Cell<Phase>,
    edge_waiters: RefCell<Vec<Waker>>,
    settle_waiters: RefCell<Vec<Waker>>,
    signals: RefCell<Vec<Signal>>,
    by_name: RefCell<HashMap<String, Signal>>,
    peripherals: RefCell<Vec<Box<dyn Peripheral>>>,
    trace: RefCell<Option<Trace>>,
    spawner: LocalSpawner,
}

impl Shared {
    fn commit(&self) {
        let cycle = self.cycle.get();
        let mut trace = self.trace.borrow_mut();
        for signal in self.signals.borrow().iter() {
            if let Some(value) = signal.commit() {
                if let Some(trace) = trace.as_mut() {
                    trace.record(cycle, signal.name(), value);
                }
            }
        }
    }

    fn advance(&self) {
        match self.phase.get() {
            Phase::Edge => {
                self.commit();
                self.settles.set(self.settles.get() + 1);
                self.phase.set(Phase::Settle);
                wake_all(&self.settle_waiters);
            }
            Phase::Settle => {
                self.cycle.set(self.cycle.get() + 1);
                self.phase.set(Phase::Edge);
                for peripheral in self.peripherals.borrow_mut().iter_mut() {
                    peripheral.on_edge();
                }
                wake_all(&self.edge_waiters);
            }
        }
    }
}

fn wake_all(waiters: &RefCell<Vec<Waker>>) {
    let waiters = std::mem::take(&mut *waiters.borrow_mut());
    for waker in waiters {
        waker.wake();
    }
}

/// Cloneable handle that bus engines use to reach the clock and scheduler.
#[derive(Clone)]
pub struct SimHandle {
    shared: Rc<Shared>,
}

impl SimHandle {
    /// Number of rising edges since the start of the run.
    pub fn cycle(&self) -> u64 {
        self.shared.cycle.get()
    }

    /// Current simulated time in steps.
    pub fn time(&self) -> u64 {
        self.shared.cycle.get() * self.shared.period_steps
    }

    /// Suspends until the next rising edge.
    pub fn next_edge(&self) -> NextEdge {
        NextEdge {
            shared: self.shared.clone(),
            target: self.shared.cycle.get() + 1,
        }
    }

    /// Suspends until the next settle point.
    pub fn settle(&self) -> SettlePoint {
        SettlePoint {
            shared: self.shared.clone(),
            target: self.shared.settles.get() + 1,
        }
    }

    /// Suspends for `n` rising edges.
    pub async fn clock_cycles(&self, n: u64) {
        for _ in 0..n {
            self.next_edge().await;
        }
    }

    /// Starts `task` as an independent concurrent operation.
    ///
    /// The task first runs once the current caller suspends.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        if let Err(e) = self.shared.spawner.spawn_local(task) {
            log::error!("failed to spawn simulation task: {}", e);
        }
    }

    /// Looks up a registered signal by its physical name.
    pub fn lookup(&self, name: &str) -> Option<Signal> {
        self.shared.by_name.borrow().get(name).cloned()
    }
}

#[derive(Default)]
struct MainWake {
    woken: AtomicBool,
}

impl ArcWake for MainWake {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::Release);
    }
}

/// Owner of the simulation: signals, peripherals, clock and scheduler.
pub struct Simulator {
    pool: LocalPool,
    handle: SimHandle,
    max_cycles: u64,
}

impl Simulator {
    /// Creates a simulator whose clock cycle spans `period_steps` time steps.
    ///
    /// The simulator starts just after edge 0, before its first settle point.
    pub fn new(period_steps: u64) -> Self {
        let pool = LocalPool::new();
        let trace = cfg!(feature = "always-trace").then(|| Trace::new(period_steps));
        let shared = Shared {
            period_steps,
            cycle: Cell::new(0),
            settles: Cell::new(0),
            phase: Cell::new(Phase::Edge),
            edge_waiters: RefCell::new(Vec::new()),
            settle_waiters: RefCell::new(Vec::new()),
            signals: RefCell::new(Vec::new()),
            by_name: RefCell::new(HashMap::new()),
            peripherals: RefCell::new(Vec::new()),
            trace: RefCell::new(trace),
            spawner: pool.spawner(),
        };
        Self {
            pool,
            handle: SimHandle {
                shared: Rc::new(shared),
            },
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }

    /// Sets the watchdog limit: runs fail once this many cycles have elapsed.
    pub fn set_watchdog(&mut self, max_cycles: u64) {
        self.max_cycles = max_cycles;
    }

    /// Starts recording a waveform trace.
    pub fn enable_trace(&mut self) {
        let mut trace = self.handle.shared.trace.borrow_mut();
        if trace.is_none() {
            *trace = Some(Trace::new(self.handle.shared.period_steps));
        }
    }

    /// Returns a copy of the trace recorded so far, if tracing is enabled.
    pub fn trace(&self) -> Option<Trace> {
        self.handle.shared.trace.borrow().clone()
    }

    /// Returns a handle for bus engines and spawned tasks.
    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }

    /// Creates (or returns the existing) signal called `name`.
    pub fn signal(&mut self, name: &str, width: u32) -> Signal {
        let shared = &self.handle.shared;
        if let Some(existing) = shared.by_name.borrow().get(name) {
            return existing.clone();
        }
        let signal = Signal::new(name, width);
        shared.signals.borrow_mut().push(signal.clone());
        shared
            .by_name
            .borrow_mut()
            .insert(name.to_string(), signal.clone());
        signal
    }

    /// Looks up a registered signal by its physical name.
    pub fn lookup(&self, name: &str) -> Option<Signal> {
        self.handle.lookup(name)
    }

    /// Attaches a peripheral model, clocked on every rising edge.
    pub fn add_peripheral(&mut self, peripheral: Box<dyn Peripheral>) {
        log::debug!("attached peripheral {}", peripheral.name());
        self.handle.shared.peripherals.borrow_mut().push(peripheral);
    }

    /// Number of rising edges since the start of the run.
    pub fn cycle(&self) -> u64 {
        self.handle.cycle()
    }

    /// Current simulated time in steps.
    pub fn time(&self) -> u64 {
        self.handle.time()
    }

    /// Starts `task` as an independent concurrent operation.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.handle.spawn(task);
    }

    /// Runs the simulation until `fut` completes and returns its output.
    ///
    /// Spawned tasks keep running alongside `fut`. When `fut` completes,
    /// tasks released at the same instant run until they suspend; their
    /// remaining work resumes on the next call.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Watchdog`] if the cycle count reaches the watchdog
    /// limit before `fut` completes.
    pub fn run_until<F: Future>(&mut self, fut: F) -> Result<F::Output, SimError> {
        let wake = Arc::new(MainWake::default());
        let main_waker = waker(wake.clone());
        let mut cx = Context::from_waker(&main_waker);
        let mut fut = pin!(fut);
        wake.woken.store(true, Ordering::Release);

        loop {
            if wake.woken.swap(false, Ordering::AcqRel) {
                if let Poll::Ready(out) = fut.as_mut().poll(&mut cx) {
                    // Tasks woken at this same instant still get to run.
                    self.pool.run_until_stalled();
                    return Ok(out);
                }
            }
            self.pool.run_until_stalled();
            if wake.woken.load(Ordering::Acquire) {
                continue;
            }
            if self.handle.cycle() >= self.max_cycles {
                return Err(SimError::Watchdog {
                    cycles: self.handle.cycle(),
                });
            }
            self.handle.shared.advance();
        }
    }

    /// Advances the simulation by `n` clock cycles.
    pub fn run_cycles(&mut self, n: u64) -> Result<(), SimError> {
        let handle = self.handle();
        self.run_until(handle.clock_cycles(n))
    }
}
