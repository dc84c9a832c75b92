use super::context;
use super::task::{JoinHandle, ROOT, Scheduler};
use crate::reactor::Reactor;

use std::future::Future;
use std::io;
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// State shared by everything bound to one runtime.
pub(crate) struct Core {
    pub(crate) reactor: Reactor,
    pub(crate) scheduler: Scheduler,
}

/// The main runtime handle.
///
/// A `Runtime` is a single-threaded cooperative event loop. It owns:
/// - a local task scheduler,
/// - a reactor driving readiness watches and timers,
/// - a synchronous entry point via [`block_on`](Self::block_on).
///
/// The runtime is `!Send`: tasks, sockets and watches created under
/// it stay on the thread that built it.
pub struct Runtime {
    core: Rc<Core>,
}

impl Runtime {
    /// Creates a new runtime instance.
    pub(crate) fn new(event_capacity: usize, task_capacity: usize) -> io::Result<Self> {
        let reactor = Reactor::new(event_capacity)?;
        let scheduler = Scheduler::new(task_capacity, reactor.notifier());

        Ok(Self {
            core: Rc::new(Core { reactor, scheduler }),
        })
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task starts running on the next call to
    /// [`block_on`](Self::block_on).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 7 });
    /// assert_eq!(runtime.block_on(handle), 7);
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.core.scheduler.spawn(future)
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// Spawned tasks make progress while the future is pending. Tasks
    /// still pending when it completes stay parked until the next
    /// `block_on` or until the runtime is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the OS poller fails, or if a task panics.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let _enter = context::enter(self.core.clone());
        let mut future = pin!(future);

        let scheduler = &self.core.scheduler;
        let root = scheduler.root();
        let waker = Waker::from(root.clone());
        let mut cx = Context::from_waker(&waker);

        root.schedule();

        loop {
            // Tasks woken during this round run in the next one.
            for _ in 0..scheduler.ready().len() {
                let Some(id) = scheduler.ready().pop() else {
                    break;
                };

                if id != ROOT {
                    scheduler.run(id);
                    continue;
                }

                root.reset();
                if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                    return output;
                }
            }

            if let Err(err) = self.core.reactor.turn(scheduler.ready()) {
                panic!("greenwire reactor failed: {err}");
            }
        }
    }
}
