use super::handle::{JoinHandle, joinable};
use super::waker::{ReadyQueue, TaskWaker};
use crate::reactor::poller::Notifier;
use crate::runtime::context;
use crate::utils::Slab;

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Waker};

/// Id reserved for the future driven by `block_on`.
pub(crate) const ROOT: usize = usize::MAX;

/// A spawned task owned by the scheduler.
struct Task {
    /// Taken out while the task is being polled.
    future: Option<Pin<Box<dyn Future<Output = ()>>>>,

    waker: Arc<TaskWaker>,
}

/// Local task scheduler.
///
/// Tasks are `!Send` and never leave the runtime thread; only their
/// ids travel through the [`ReadyQueue`].
pub(crate) struct Scheduler {
    tasks: RefCell<Slab<Task>>,
    ready: Arc<ReadyQueue>,
}

impl Scheduler {
    pub(crate) fn new(task_capacity: usize, notifier: Arc<Notifier>) -> Self {
        Self {
            tasks: RefCell::new(Slab::new(task_capacity)),
            ready: Arc::new(ReadyQueue::new(notifier)),
        }
    }

    pub(crate) fn ready(&self) -> &ReadyQueue {
        &self.ready
    }

    /// Creates the waker of the `block_on` root future.
    pub(crate) fn root(&self) -> Arc<TaskWaker> {
        Arc::new(TaskWaker::new(ROOT, self.ready.clone()))
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let (task, handle) = joinable(future);

        let waker = {
            let mut tasks = self.tasks.borrow_mut();
            let id = tasks.vacant_key();
            let waker = Arc::new(TaskWaker::new(id, self.ready.clone()));

            tasks.insert(Task {
                future: Some(Box::pin(task)),
                waker: waker.clone(),
            });

            waker
        };

        waker.schedule();
        handle
    }

    /// Polls the task `id` once. Stale ids are ignored.
    pub(crate) fn run(&self, id: usize) {
        let taken = {
            let mut tasks = self.tasks.borrow_mut();
            tasks
                .get_mut(id)
                .and_then(|task| Some((task.future.take()?, task.waker.clone())))
        };

        let Some((mut future, waker)) = taken else {
            return;
        };

        waker.reset();
        let waker = Waker::from(waker);
        let mut cx = Context::from_waker(&waker);

        if future.as_mut().poll(&mut cx).is_ready() {
            let finished = self.tasks.borrow_mut().remove(id);
            drop(finished);
        } else if let Some(task) = self.tasks.borrow_mut().get_mut(id) {
            task.future = Some(future);
        }
    }
}

/// Spawns a future as a task onto the current runtime.
///
/// The task runs on the runtime thread, interleaved with the other
/// tasks, and may therefore hold `!Send` state such as a
/// [`GreenSocket`](crate::GreenSocket).
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    context::current().scheduler.spawn(future)
}
