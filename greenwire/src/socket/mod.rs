//! Cooperative sockets.
//!
//! [`GreenSocket`] wraps a non-blocking [`Transport`] so that tasks on
//! one runtime can call `send`/`recv` as if they blocked. A call that
//! would block parks the task on a per-direction [`ReadinessGate`]
//! until the reactor reports an edge on the transport's descriptor.
//!
//! ## Design notes
//!
//! - At most one task may wait per direction. A second concurrent
//!   reader (or writer) panics instead of racing the first.
//! - Each wait is bounded by a watchdog ([`SocketConfig::watchdog`]).
//!   Expiry never surfaces as an error; the task simply retries.
//! - Every logical call ends with exactly one readiness resync, so
//!   observers of the descriptor see one edge per call. Multi-frame
//!   transfers resync once for the whole batch.
//! - Closing wakes any parked task, which then fails with
//!   [`SocketError::Closed`].

mod batch;
mod config;
mod watch;
mod watchdog;

pub use config::{DEFAULT_WATCHDOG, DIAGNOSTICS_ENV, SocketConfig, WATCHDOG_ENV};

use crate::error::{Result, SocketError};
use crate::reactor::poller::Interest;
use crate::reactor::poller::platform::sys_poll_events;
use crate::runtime::context;
use crate::sync::ReadinessGate;
use crate::transport::{Attempt, Direction, Flags, Frame, OptionValue, SocketOption, Transport};
use batch::BatchState;
use watch::ReadinessWatch;
use watchdog::{WaitOutcome, Watchdog};

use bytes::Bytes;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace, warn};

/// Counters describing a socket's readiness traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketStats {
    /// Resyncs issued after socket calls and option changes.
    pub resyncs: u64,

    /// Reactor callbacks received from the readiness watch.
    pub edges: u64,

    /// Waits ended by the watchdog rather than a signal.
    pub watchdog_expiries: u64,

    /// Expiries where the socket was ready all along (diagnostics only).
    pub missed_events: u64,
}

/// A cooperative socket over a non-blocking transport.
///
/// Cloning is cheap and yields another handle to the same socket. The
/// socket is closed by [`close`](Self::close) or when the last handle
/// is dropped.
///
/// # Example
/// ```rust,ignore
/// let (a, b) = DatagramTransport::pair()?;
/// let a = GreenSocket::new(a)?;
/// let b = GreenSocket::new(b)?;
///
/// a.send(b"ping", Flags::NONE).await?;
/// assert_eq!(b.recv(Flags::NONE).await?.payload, "ping");
/// ```
pub struct GreenSocket<T: Transport> {
    shared: Rc<Shared<T>>,
}

struct Shared<T: Transport> {
    transport: RefCell<T>,
    fd: RawFd,
    closed: Cell<bool>,

    readable: ReadinessGate,
    writable: ReadinessGate,

    watch: ReadinessWatch,
    watchdog: Watchdog,
    batch: BatchState,
    stats: Cell<SocketStats>,

    /// Cached [`Transport::tracks_writability`].
    tracks_writability: bool,
}

impl<T: Transport + 'static> GreenSocket<T> {
    /// Wraps `transport` with configuration taken from the environment.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn new(transport: T) -> Result<Self> {
        Self::with_config(transport, SocketConfig::from_env())
    }

    /// Wraps `transport` and starts watching its descriptor.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a running runtime.
    pub fn with_config(transport: T, config: SocketConfig) -> Result<Self> {
        let core = context::current();
        let fd = transport.descriptor();
        let tracks_writability = transport.tracks_writability();

        let shared = Rc::new(Shared {
            transport: RefCell::new(transport),
            fd,
            closed: Cell::new(false),
            readable: ReadinessGate::new(),
            writable: ReadinessGate::new(),
            watch: ReadinessWatch::new(fd, &core),
            watchdog: Watchdog::new(&config),
            batch: BatchState::default(),
            stats: Cell::new(SocketStats::default()),
            tracks_writability,
        });

        let weak = Rc::downgrade(&shared);
        shared.watch.start(Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_edge();
            }
        }))?;

        Ok(Self { shared })
    }
}

impl<T: Transport> GreenSocket<T> {
    /// Sends one frame, waiting for writability if needed.
    ///
    /// With [`Flags::DONT_WAIT`] exactly one attempt is made and a full
    /// transport fails with [`SocketError::WouldBlock`].
    pub async fn send(&self, frame: impl AsRef<[u8]>, flags: Flags) -> Result<()> {
        let frame = frame.as_ref();

        self.shared
            .perform(Direction::Write, flags.dont_wait, |transport| {
                transport.send(frame, flags.more)
            })
            .await
    }

    /// Receives one frame, waiting for readability if needed.
    pub async fn recv(&self, flags: Flags) -> Result<Frame> {
        self.shared
            .perform(Direction::Read, flags.dont_wait, |transport| transport.recv())
            .await
    }

    /// Sends all `frames` as one multi-frame message.
    ///
    /// Every frame but the last carries the `more` flag. A single
    /// resync is issued once the batch ends, whether it succeeded or
    /// failed partway.
    pub async fn send_batch<I>(&self, frames: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let shared = &self.shared;
        let _scope = shared
            .batch
            .enter(Direction::Write, || shared.notify_state_changed());

        let mut frames = frames.into_iter().peekable();
        while let Some(frame) = frames.next() {
            let more = frames.peek().is_some();
            self.send(frame, Flags { more, ..Flags::NONE }).await?;
        }

        Ok(())
    }

    /// Receives every frame of the next message.
    pub async fn recv_batch(&self) -> Result<Vec<Bytes>> {
        let shared = &self.shared;
        let _scope = shared
            .batch
            .enter(Direction::Read, || shared.notify_state_changed());

        let mut frames = Vec::new();
        loop {
            let frame = self.recv(Flags::NONE).await?;
            frames.push(frame.payload);

            if !frame.more {
                return Ok(frames);
            }
        }
    }

    /// Reads a socket option.
    ///
    /// Reading [`SocketOption::Events`] resyncs readiness.
    pub fn get_option(&self, option: SocketOption) -> Result<OptionValue> {
        let shared = &self.shared;
        shared.ensure_open()?;

        if option.is_timeout() {
            warn!(?option, "timeout options have no effect on cooperative sockets");
        }

        let value = shared.transport.borrow().get_option(option)?;

        if option == SocketOption::Events {
            shared.notify_state_changed();
        }

        Ok(value)
    }

    /// Sets a socket option.
    ///
    /// Subscription changes resync readiness.
    pub fn set_option(&self, option: SocketOption, value: OptionValue) -> Result<()> {
        let shared = &self.shared;
        shared.ensure_open()?;

        if option.is_timeout() {
            warn!(?option, "timeout options have no effect on cooperative sockets");
        }

        shared.transport.borrow_mut().set_option(option, value)?;

        if option.changes_subscription() {
            shared.notify_state_changed();
        }

        Ok(())
    }

    /// Closes the socket and wakes any parked task. Idempotent.
    pub fn close(&self) {
        self.shared.close(None);
    }

    /// Like [`close`](Self::close), forwarding `linger` to the transport.
    pub fn close_with_linger(&self, linger: Option<Duration>) {
        self.shared.close(linger);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }

    pub fn descriptor(&self) -> RawFd {
        self.shared.fd
    }

    pub fn stats(&self) -> SocketStats {
        self.shared.stats.get()
    }
}

impl<T: Transport> Shared<T> {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.get() {
            return Err(SocketError::Closed);
        }

        Ok(())
    }

    fn record(&self, update: impl FnOnce(&mut SocketStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    /// Retries `op` until it completes, fails, or the socket closes.
    async fn perform<R>(
        &self,
        direction: Direction,
        dont_wait: bool,
        mut op: impl FnMut(&mut T) -> Attempt<R>,
    ) -> Result<R> {
        let result = loop {
            if self.closed.get() {
                break Err(SocketError::Closed);
            }

            let attempt = {
                let mut transport = self.transport.borrow_mut();
                op(&mut *transport)
            };

            match attempt {
                Attempt::Ready(value) => break Ok(value),
                Attempt::Failed(err) => break Err(SocketError::Transport(err)),
                Attempt::WouldBlock if dont_wait => break Err(SocketError::WouldBlock),
                Attempt::WouldBlock => {
                    if let Err(err) = self.wait_for(direction).await {
                        break Err(err);
                    }
                }
            }
        };

        if !self.batch.is_active(direction) {
            self.notify_state_changed();
        }

        result
    }

    /// Parks the calling task until `direction` may be ready again.
    async fn wait_for(&self, direction: Direction) -> Result<()> {
        let gate = match direction {
            Direction::Read => &self.readable,
            Direction::Write => &self.writable,
        };

        // Signal-style descriptors report write progress as read edges.
        let interest = match direction {
            Direction::Write if self.tracks_writability => Interest::WRITABLE,
            _ => Interest::READABLE,
        };
        let _armed = self.watch.arm(interest)?;

        let outcome = self
            .watchdog
            .wait(gate, self.fd, direction, || self.transport.borrow().events())
            .await;

        if let WaitOutcome::Expired { missed_event } = outcome {
            trace!(fd = self.fd, ?direction, "watchdog expired, retrying");
            self.record(|stats| {
                stats.watchdog_expiries += 1;
                stats.missed_events += u64::from(missed_event);
            });
        }

        Ok(())
    }

    /// Reactor callback for the readiness watch.
    fn on_edge(&self) {
        self.record(|stats| stats.edges += 1);
        trace!(fd = self.fd, "readiness edge");

        self.state_changed();
    }

    fn notify_state_changed(&self) {
        self.record(|stats| stats.resyncs += 1);
        trace!(fd = self.fd, "readiness resync");

        self.state_changed();
    }

    /// Opens whichever gates the descriptor currently reports ready.
    fn state_changed(&self) {
        if self.closed.get() {
            self.watch.teardown();
            return;
        }

        match sys_poll_events(self.fd) {
            Ok(events) => {
                if events.writable {
                    self.writable.signal();
                }
                if events.readable {
                    self.readable.signal();
                }
            }
            Err(err) => {
                // Let the waiters hit the failure on their next attempt.
                debug!(fd = self.fd, error = %err, "readiness probe failed");
                self.writable.signal();
                self.readable.signal();
            }
        }
    }

    fn close(&self, linger: Option<Duration>) {
        if self.closed.replace(true) {
            return;
        }

        self.watch.teardown();
        self.transport.borrow_mut().close(linger);
        debug!(fd = self.fd, ?linger, "socket closed");

        self.readable.signal();
        self.writable.signal();
    }
}

impl<T: Transport> Drop for Shared<T> {
    fn drop(&mut self) {
        self.close(None);
    }
}

impl<T: Transport> Clone for GreenSocket<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Transport> fmt::Debug for GreenSocket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenSocket")
            .field("fd", &self.shared.fd)
            .field("closed", &self.shared.closed.get())
            .field("watching", &self.shared.watch.is_active())
            .field("readable", &self.shared.readable)
            .field("writable", &self.shared.writable)
            .finish()
    }
}
