//! Reactor core and event handling.
//!
//! The reactor lives on the runtime thread and is driven by
//! [`Runtime::block_on`](crate::runtime::Runtime::block_on) between
//! rounds of task execution. Each [`turn`](Reactor::turn):
//! - blocks on the OS poller until a watched descriptor is ready, a
//!   timer is due, or a task is woken from another thread,
//! - dispatches watch callbacks synchronously,
//! - fires expired timers.
//!
//! Watch callbacks run on the dispatch path and must not suspend.
//! They may register or remove watches, including their own.
//!
//! A watch with empty interest keeps its token and callback but is
//! absent from the OS poller, so an idle descriptor costs nothing
//! even while it stays ready.

mod event;
mod timer;

pub(crate) mod poller;

use crate::runtime::task::ReadyQueue;
use crate::utils::Slab;
use event::Event;
use poller::{Interest, Notifier, Poller};
use timer::TimerEntry;

use std::cell::RefCell;
use std::collections::BinaryHeap;
use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Waker;
use std::time::{Duration, Instant};

use tracing::trace;

/// A registered readiness watch.
struct Watcher {
    fd: RawFd,
    interest: Interest,
    callback: Rc<dyn Fn()>,
}

pub(crate) struct Reactor {
    poller: RefCell<Poller>,

    /// Events filled by the last poll, reused across turns.
    events: RefCell<Vec<Event>>,

    timers: RefCell<BinaryHeap<TimerEntry>>,

    /// Watch callbacks keyed by their poller token.
    watchers: RefCell<Slab<Watcher>>,
}

impl Reactor {
    pub(crate) fn new(event_capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poller: RefCell::new(Poller::new(event_capacity)?),
            events: RefCell::new(Vec::with_capacity(event_capacity)),
            timers: RefCell::new(BinaryHeap::new()),
            watchers: RefCell::new(Slab::new(16)),
        })
    }

    pub(crate) fn notifier(&self) -> Arc<Notifier> {
        self.poller.borrow().notifier()
    }

    /// Registers `callback` to run whenever `fd` is ready for `interest`.
    ///
    /// Returns the token identifying the watch.
    pub(crate) fn watch(
        &self,
        fd: RawFd,
        interest: Interest,
        callback: Rc<dyn Fn()>,
    ) -> io::Result<usize> {
        let mut watchers = self.watchers.borrow_mut();
        let token = watchers.vacant_key();

        if !interest.is_empty() {
            self.poller.borrow().register(fd, token, interest)?;
        }
        watchers.insert(Watcher {
            fd,
            interest,
            callback,
        });

        Ok(token)
    }

    /// Changes the interest of an existing watch.
    ///
    /// Moving to or from empty interest adds or removes the descriptor
    /// from the poller; the callback stays registered either way.
    pub(crate) fn rewatch(&self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        let mut watchers = self.watchers.borrow_mut();
        let Some(watcher) = watchers.get_mut(token).filter(|watcher| watcher.fd == fd) else {
            return Ok(());
        };

        let current = watcher.interest;
        if current == interest {
            return Ok(());
        }

        let poller = self.poller.borrow();
        match (current.is_empty(), interest.is_empty()) {
            (true, _) => poller.register(fd, token, interest)?,
            (false, true) => poller.deregister(fd)?,
            (false, false) => poller.reregister(fd, token, interest)?,
        }

        watcher.interest = interest;
        Ok(())
    }

    /// Removes a watch. Unknown tokens are ignored.
    pub(crate) fn unwatch(&self, fd: RawFd, token: usize) -> io::Result<()> {
        let owned = self
            .watchers
            .borrow()
            .get(token)
            .is_some_and(|watcher| watcher.fd == fd);

        if !owned {
            return Ok(());
        }

        let watcher = self.watchers.borrow_mut().remove(token);
        let result = match &watcher {
            Some(watcher) if !watcher.interest.is_empty() => self.poller.borrow().deregister(fd),
            _ => Ok(()),
        };

        // Released outside the registry borrow.
        drop(watcher);

        result
    }

    /// Schedules `waker` to be woken once `deadline` is reached.
    pub(crate) fn add_timer(&self, deadline: Instant, waker: Waker, cancelled: Arc<AtomicBool>) {
        self.timers.borrow_mut().push(TimerEntry {
            deadline,
            waker,
            cancelled,
        });
    }

    /// Time left until the earliest live timer, dropping cancelled ones.
    fn next_timeout(&self) -> Option<Duration> {
        let mut timers = self.timers.borrow_mut();

        while let Some(entry) = timers.peek() {
            if entry.cancelled.load(Ordering::Acquire) {
                timers.pop();
                continue;
            }

            return Some(entry.deadline.saturating_duration_since(Instant::now()));
        }

        None
    }

    /// Runs one reactor iteration.
    ///
    /// Blocks only when `ready` holds no runnable task. The queue is
    /// marked parked for the duration of the poll so that wakers know
    /// to interrupt it.
    pub(crate) fn turn(&self, ready: &ReadyQueue) -> io::Result<()> {
        let mut timeout = if ready.is_empty() {
            self.next_timeout()
        } else {
            Some(Duration::ZERO)
        };

        ready.park();

        // A wake may have landed between the check above and parking.
        if !ready.is_empty() {
            timeout = Some(Duration::ZERO);
        }

        let polled = {
            let mut events = self.events.borrow_mut();
            self.poller.borrow_mut().poll(&mut events, timeout)
        };

        ready.unpark();
        polled?;

        self.dispatch();
        self.fire_timers();

        Ok(())
    }

    fn dispatch(&self) {
        let events = std::mem::take(&mut *self.events.borrow_mut());

        for event in &events {
            trace!(
                token = event.token,
                readable = event.readable,
                writable = event.writable,
                "dispatching readiness"
            );

            // Cloned out so the callback can touch the registry.
            let callback = self
                .watchers
                .borrow()
                .get(event.token)
                .map(|watcher| watcher.callback.clone());

            if let Some(callback) = callback {
                callback();
            }
        }

        let mut slot = self.events.borrow_mut();
        if slot.is_empty() {
            *slot = events;
        }
    }

    fn fire_timers(&self) {
        let now = Instant::now();

        loop {
            let entry = {
                let mut timers = self.timers.borrow_mut();
                match timers.peek() {
                    Some(entry) if entry.deadline <= now => timers.pop(),
                    _ => None,
                }
            };

            let Some(entry) = entry else {
                break;
            };

            if !entry.cancelled.load(Ordering::Acquire) {
                entry.waker.wake();
            }
        }
    }
}
