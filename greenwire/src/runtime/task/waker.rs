use crate::reactor::poller::Notifier;

use crossbeam_queue::SegQueue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Wake;

/// Queue of task ids waiting to be polled.
///
/// Tasks themselves never leave the runtime thread, but their wakers
/// are `Send + Sync` and may fire from anywhere. Waking only pushes an
/// id here; when the runtime is blocked in the poller, the notifier
/// interrupts it.
pub(crate) struct ReadyQueue {
    queue: SegQueue<usize>,
    notifier: Arc<Notifier>,

    /// Set while the runtime thread is blocked in the poller.
    parked: AtomicBool,
}

impl ReadyQueue {
    pub(crate) fn new(notifier: Arc<Notifier>) -> Self {
        Self {
            queue: SegQueue::new(),
            notifier,
            parked: AtomicBool::new(false),
        }
    }

    pub(crate) fn push(&self, id: usize) {
        self.queue.push(id);

        if self.parked.load(Ordering::SeqCst) {
            self.notifier.notify();
        }
    }

    pub(crate) fn pop(&self) -> Option<usize> {
        self.queue.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn park(&self) {
        self.parked.store(true, Ordering::SeqCst);
    }

    pub(crate) fn unpark(&self) {
        self.parked.store(false, Ordering::SeqCst);
    }
}

/// Waker for a single task, identified by its slab index.
pub(crate) struct TaskWaker {
    id: usize,

    /// Prevents the same task from being queued twice between polls.
    queued: AtomicBool,

    ready: Arc<ReadyQueue>,
}

impl TaskWaker {
    pub(crate) fn new(id: usize, ready: Arc<ReadyQueue>) -> Self {
        Self {
            id,
            queued: AtomicBool::new(false),
            ready,
        }
    }

    pub(crate) fn schedule(&self) {
        if !self.queued.swap(true, Ordering::AcqRel) {
            self.ready.push(self.id);
        }
    }

    /// Called right before the task is polled, so that wakes issued
    /// during the poll queue it again.
    pub(crate) fn reset(&self) {
        self.queued.store(false, Ordering::Release);
    }
}

impl Wake for TaskWaker {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.schedule();
    }
}
