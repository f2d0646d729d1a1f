//! Suspension points.
//!
//! Simulation code suspends only on these futures. None of them block a
//! thread: they register a waker with the kernel and are resumed when the
//! kernel advances past the awaited point.

use super::Shared;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Resumes at the next rising clock edge.
pub struct NextEdge {
    pub(super) shared: Rc<Shared>,
    pub(super) target: u64,
}

impl Future for NextEdge {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.shared.cycle.get() >= self.target {
            Poll::Ready(())
        } else {
            self.shared.edge_waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

/// Resumes at the next settle point.
///
/// Awaited after an edge, this is the settle point of that same cycle. Awaited
/// from within a settle point, it is the settle point of the following cycle.
pub struct SettlePoint {
    pub(super) shared: Rc<Shared>,
    pub(super) target: u64,
}

impl Future for SettlePoint {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.shared.settles.get() >= self.target {
            Poll::Ready(())
        } else {
            self.shared
                .settle_waiters
                .borrow_mut()
                .push(cx.waker().clone());
            Poll::Pending
        }
    }
}

#[derive(Default)]
struct EventInner {
    set: Cell<bool>,
    waiters: RefCell<Vec<Waker>>,
}

/// A repeatable flag that operations can wait on.
///
/// `set` releases every current waiter, in the order they started waiting.
/// The flag stays raised until `clear` is called, so a wait that starts after
/// `set` returns immediately.
#[derive(Clone, Default)]
pub struct Event {
    inner: Rc<EventInner>,
}

impl Event {
    /// Creates a cleared event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag and wakes all waiters.
    pub fn set(&self) {
        self.inner.set.set(true);
        let waiters = std::mem::take(&mut *self.inner.waiters.borrow_mut());
        for waker in waiters {
            waker.wake();
        }
    }

    /// Lowers the flag.
    pub fn clear(&self) {
        self.inner.set.set(false);
    }

    /// Returns whether the flag is raised.
    pub fn is_set(&self) -> bool {
        self.inner.set.get()
    }

    /// Suspends until the flag is raised.
    pub fn wait(&self) -> EventWait {
        EventWait {
            inner: self.inner.clone(),
        }
    }
}

/// Future returned by [`Event::wait`].
pub struct EventWait {
    inner: Rc<EventInner>,
}

impl Future for EventWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.inner.set.get() {
            Poll::Ready(())
        } else {
            self.inner.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}
