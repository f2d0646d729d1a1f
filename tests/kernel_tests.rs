//! Integration tests for the simulation kernel.

use futures::join;
use plsim::kernel::{Event, Simulator};
use plsim::soc::Peripheral;
use std::cell::RefCell;
use std::rc::Rc;

/// Counts rising edges by toggling an output line.
struct Toggler {
    out: plsim::kernel::Signal,
    edges: Rc<RefCell<u64>>,
}

impl Peripheral for Toggler {
    fn name(&self) -> &str {
        "toggler"
    }

    fn on_edge(&mut self) {
        *self.edges.borrow_mut() += 1;
        self.out.set(self.out.get() ^ 1);
    }
}

/// Tests values are masked to the signal width.
#[test]
fn test_signal_width_mask() {
    let mut sim = Simulator::new(1);
    let nibble = sim.signal("nibble", 4);
    let handle = sim.handle();
    let value = sim
        .run_until(async {
            nibble.set(0xAB);
            handle.settle().await;
            nibble.get()
        })
        .unwrap();
    assert_eq!(value, 0xB);
    assert_eq!(nibble.width(), 4);
}

/// Tests registering a name twice returns the same line.
#[test]
fn test_signal_registry() {
    let mut sim = Simulator::new(1);
    let a = sim.signal("line", 8);
    let b = sim.signal("line", 8);
    a.set(3);
    sim.run_cycles(1).unwrap();
    assert_eq!(b.get(), 3);
    assert!(sim.lookup("line").is_some());
    assert!(sim.lookup("other").is_none());
}

/// Tests peripherals see values sampled at the previous settle point.
#[test]
fn test_peripheral_edge_ordering() {
    let mut sim = Simulator::new(1);
    sim.enable_trace();
    let out = sim.signal("out", 1);
    let edges = Rc::new(RefCell::new(0));
    sim.add_peripheral(Box::new(Toggler {
        out: out.clone(),
        edges: edges.clone(),
    }));
    let handle = sim.handle();
    sim.run_cycles(4).unwrap();
    sim.run_until(handle.settle()).unwrap();

    assert_eq!(*edges.borrow(), 4);
    let trace = sim.trace().unwrap();
    assert_eq!(trace.values("out"), vec![1, 0, 1, 0]);
    let cycles: Vec<u64> = trace.changes("out").map(|c| c.cycle).collect();
    assert_eq!(cycles, vec![1, 2, 3, 4]);
}

/// Tests spawned tasks run concurrently with the awaited future.
#[test]
fn test_spawned_task_runs_alongside() {
    let mut sim = Simulator::new(1);
    let handle = sim.handle();
    let counter = Rc::new(RefCell::new(0u64));
    let c = counter.clone();
    let h = handle.clone();
    sim.spawn(async move {
        loop {
            h.next_edge().await;
            *c.borrow_mut() += 1;
        }
    });
    sim.run_cycles(6).unwrap();
    assert_eq!(*counter.borrow(), 6);
}

/// Tests an event releases waiters in the order they started waiting.
#[test]
fn test_event_wakes_in_order() {
    let mut sim = Simulator::new(1);
    let handle = sim.handle();
    let event = Event::new();
    let order = Rc::new(RefCell::new(Vec::new()));

    for id in 0..3 {
        let event = event.clone();
        let order = order.clone();
        sim.spawn(async move {
            event.wait().await;
            order.borrow_mut().push(id);
        });
    }
    let trigger = event.clone();
    sim.run_until(async {
        handle.clock_cycles(2).await;
        trigger.set();
        handle.clock_cycles(1).await;
    })
    .unwrap();

    assert_eq!(*order.borrow(), vec![0, 1, 2]);
    assert!(event.is_set());
    event.clear();
    assert!(!event.is_set());
}

/// Tests two operations awaiting different phases interleave correctly.
#[test]
fn test_edge_and_settle_interleave() {
    let mut sim = Simulator::new(1);
    let line = sim.signal("line", 8);
    let handle = sim.handle();
    let (driven, seen) = sim
        .run_until(async {
            let writer = async {
                for v in 1..=3 {
                    handle.next_edge().await;
                    line.set(v);
                }
                3
            };
            let reader = async {
                let mut seen = Vec::new();
                for _ in 0..3 {
                    handle.next_edge().await;
                    handle.settle().await;
                    seen.push(line.get());
                }
                seen
            };
            join!(writer, reader)
        })
        .unwrap();
    assert_eq!(driven, 3);
    assert_eq!(seen, vec![1, 2, 3]);
}

/// Tests the trace serialises with time stamps derived from the period.
#[test]
fn test_trace_json() {
    let mut sim = Simulator::new(250);
    sim.enable_trace();
    let line = sim.signal("line", 1);
    let handle = sim.handle();
    sim.run_until(async {
        handle.next_edge().await;
        line.set(1);
        handle.settle().await;
    })
    .unwrap();

    let json = sim.trace().unwrap().to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["changes"][0]["signal"], "line");
    assert_eq!(parsed["changes"][0]["time"], 250);
    assert_eq!(parsed["changes"][0]["cycle"], 1);
}
