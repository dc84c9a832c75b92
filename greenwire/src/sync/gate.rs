use crate::time::{Elapsed, timeout};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// A single-waiter readiness signal.
///
/// A `ReadinessGate` coordinates one task with readiness notifications
/// arriving from the reactor. It is either *open* (no task is waiting,
/// or a signal arrived) or *closed* (a task reset it and is waiting for
/// the next signal).
///
/// The gate supports exactly one waiter at a time. A second
/// [`reset`](Self::reset) while the gate is closed is a programming
/// error and panics.
///
/// # Example
/// ```rust,ignore
/// let gate = ReadinessGate::new();
///
/// let _guard = gate.arm();
/// gate.wait().await; // resumes after `gate.signal()` from elsewhere
/// ```
pub struct ReadinessGate {
    /// `true` while the gate is open.
    armed: Cell<bool>,

    /// Waker of the task blocked in [`wait`](Self::wait), if any.
    waiter: RefCell<Option<Waker>>,
}

impl ReadinessGate {
    /// Creates an open gate.
    pub fn new() -> Self {
        Self {
            armed: Cell::new(true),
            waiter: RefCell::new(None),
        }
    }

    /// Returns `true` if the gate is open.
    pub fn is_ready(&self) -> bool {
        self.armed.get()
    }

    /// Closes the gate in preparation for a wait.
    ///
    /// # Panics
    ///
    /// Panics if the gate is already closed, i.e. another task is
    /// currently waiting on it.
    pub fn reset(&self) {
        assert!(
            self.armed.get(),
            "only one task can wait on a readiness gate at a time"
        );

        self.armed.set(false);
    }

    /// Opens the gate and wakes the waiting task, if any.
    ///
    /// Idempotent and non-blocking, so it is safe to call from reactor
    /// callbacks.
    pub fn signal(&self) {
        self.armed.set(true);

        let waiter = self.waiter.borrow_mut().take();
        if let Some(waker) = waiter {
            waker.wake();
        }
    }

    /// Closes the gate and returns a guard that reopens it on drop.
    ///
    /// The guard keeps the gate from staying closed when the wait ends
    /// by timeout, error or cancellation.
    ///
    /// # Panics
    ///
    /// Panics under the same condition as [`reset`](Self::reset).
    pub fn arm(&self) -> WaitGuard<'_> {
        self.reset();
        WaitGuard { gate: self }
    }

    /// Returns a future that resolves once the gate is open.
    pub fn wait(&self) -> Wait<'_> {
        Wait { gate: self }
    }

    /// Waits for the gate to open, giving up after `duration`.
    pub async fn wait_timeout(&self, duration: Duration) -> Result<(), Elapsed> {
        timeout(duration, self.wait()).await
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("ready", &self.armed.get())
            .field("waiting", &self.waiter.borrow().is_some())
            .finish()
    }
}

/// Future returned by [`ReadinessGate::wait`].
pub struct Wait<'a> {
    gate: &'a ReadinessGate,
}

impl Future for Wait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.gate.armed.get() {
            return Poll::Ready(());
        }

        *self.gate.waiter.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for Wait<'_> {
    fn drop(&mut self) {
        // An abandoned wait must not leave a stale waker behind.
        if !self.gate.armed.get() {
            self.gate.waiter.borrow_mut().take();
        }
    }
}

/// Guard returned by [`ReadinessGate::arm`].
///
/// Reopens the gate when dropped.
pub struct WaitGuard<'a> {
    gate: &'a ReadinessGate,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        self.gate.signal();
    }
}
