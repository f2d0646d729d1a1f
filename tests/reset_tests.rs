//! Integration tests for the reset sequencer.

mod common;

use common::{bench, traced_config};
use plsim::bus::{ResetSequencer, ResetState};
use plsim::common::SimError;
use plsim::config::Config;
use plsim::kernel::Simulator;

/// Tests the sequence passes through Asserting, Settling and Ready.
#[test]
fn test_state_progression() {
    let mut system = bench(&Config::default());
    assert_eq!(system.reset.state(), ResetState::Asserting);

    system.sim.run_cycles(3).unwrap();
    assert_eq!(system.reset.state(), ResetState::Settling);
    assert!(!system.reset.is_ready());

    system.sim.run_cycles(4).unwrap();
    assert_eq!(system.reset.state(), ResetState::Ready);
    assert!(system.reset.is_ready());
}

/// Tests the ready gate opens after assert plus settle cycles.
#[test]
fn test_ready_after_assert_and_settle() {
    let mut config = Config::default();
    config.reset.assert_cycles = 5;
    config.reset.settle_cycles = 2;
    let mut system = bench(&config);
    let reset = system.reset.clone();
    system.sim.run_until(reset.await_ready()).unwrap();
    assert_eq!(system.sim.cycle(), 7);
    assert_eq!(system.sim.time(), 7 * 1000);
}

/// Tests an active-low reset line is released high after the assert window.
#[test]
fn test_active_low_waveform() {
    let mut system = bench(&traced_config());
    system.sim.run_cycles(10).unwrap();
    let trace = system.sim.trace().unwrap();
    let changes: Vec<_> = trace.changes("ap_rst_n").collect();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].cycle, 3);
    assert_eq!(changes[0].value, 1);
}

/// Tests an active-high reset pulses high, and the device still works.
#[test]
fn test_active_high_polarity() {
    let mut config = traced_config();
    config.reset.active_low = false;
    let mut system = bench(&config);
    let mmio = &system.mmio;
    let value = system
        .sim
        .run_until(async {
            mmio.write(0x0, 0x55u32).await?;
            mmio.read_word(0x0).await
        })
        .unwrap()
        .unwrap();
    assert_eq!(value, 0x55);
    assert_eq!(system.sim.trace().unwrap().values("ap_rst_n"), vec![1, 0]);
}

/// Tests engines block forever when reset is never started.
#[test]
fn test_no_reset_blocks_engines() {
    let mut config = Config::default();
    config.reset.on_init = false;
    config.simulation.max_cycles = 50;
    let mut system = bench(&config);
    let mmio = &system.mmio;
    let err = system.sim.run_until(mmio.write(0x0, 1u32)).unwrap_err();
    assert!(matches!(err, SimError::Watchdog { cycles: 50 }));
    assert_eq!(system.stats.borrow().register_writes, 0);
}

/// Tests an explicit start releases engines that were already waiting.
#[test]
fn test_late_start_releases_waiters() {
    let mut config = Config::default();
    config.reset.on_init = false;
    let mut system = bench(&config);
    system.sim.run_cycles(10).unwrap();
    assert_eq!(system.reset.state(), ResetState::Asserting);

    system.reset.start(3, 4);
    let mmio = &system.mmio;
    system.sim.run_until(mmio.write(0x0, 1u32)).unwrap().unwrap();
    assert!(system.reset.is_ready());
    assert_eq!(system.stats.borrow().register_writes, 1);
}

/// Tests a second start does not rerun the sequence.
#[test]
fn test_start_runs_once() {
    let mut sim = Simulator::new(1);
    sim.enable_trace();
    let rst = sim.signal("rst", 1);
    let reset = ResetSequencer::new(sim.handle(), rst, false);
    reset.start(2, 2);
    let waiter = reset.clone();
    sim.run_until(waiter.await_ready()).unwrap();

    reset.start(2, 2);
    sim.run_cycles(10).unwrap();
    assert_eq!(reset.state(), ResetState::Ready);
    assert_eq!(sim.trace().unwrap().values("rst"), vec![1, 0]);
}
