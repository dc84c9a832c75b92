use crate::reactor::poller::Interest;
use crate::runtime::Core;

use std::cell::Cell;
use std::io;
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

/// Binds a socket descriptor to a reactor callback.
///
/// The callback is registered for the socket's whole life, but the
/// descriptor is only polled while some wait holds an
/// [`ArmedInterest`]. Between calls a ready descriptor stays quiet;
/// the resync at the end of every call covers that window.
///
/// It holds the runtime weakly, so a socket outliving its runtime
/// tears down without touching a dead reactor.
pub(crate) struct ReadinessWatch {
    fd: RawFd,
    token: Cell<Option<usize>>,

    /// Live guards per direction.
    readers: Cell<usize>,
    writers: Cell<usize>,

    core: Weak<Core>,
}

impl ReadinessWatch {
    pub(crate) fn new(fd: RawFd, core: &Rc<Core>) -> Self {
        Self {
            fd,
            token: Cell::new(None),
            readers: Cell::new(0),
            writers: Cell::new(0),
            core: Rc::downgrade(core),
        }
    }

    /// Registers `callback` to run on every readiness edge.
    pub(crate) fn start(&self, callback: Rc<dyn Fn()>) -> io::Result<()> {
        let Some(core) = self.core.upgrade() else {
            return Err(io::Error::other("runtime is gone"));
        };

        let token = core.reactor.watch(self.fd, self.interest(), callback)?;
        self.token.set(Some(token));

        debug!(fd = self.fd, token, "readiness watch started");
        Ok(())
    }

    pub(crate) fn is_active(&self) -> bool {
        self.token.get().is_some()
    }

    fn interest(&self) -> Interest {
        Interest {
            read: self.readers.get() > 0,
            write: self.writers.get() > 0,
        }
    }

    /// Polls the descriptor for `interest` until the guard is dropped.
    pub(crate) fn arm(&self, interest: Interest) -> io::Result<ArmedInterest<'_>> {
        self.adjust(interest, |n| n + 1);

        if let Err(err) = self.sync() {
            self.adjust(interest, |n| n - 1);
            return Err(err);
        }

        Ok(ArmedInterest {
            watch: self,
            interest,
        })
    }

    fn adjust(&self, interest: Interest, step: impl Fn(usize) -> usize) {
        if interest.read {
            self.readers.set(step(self.readers.get()));
        }
        if interest.write {
            self.writers.set(step(self.writers.get()));
        }
    }

    /// Pushes the current interest to the reactor.
    fn sync(&self) -> io::Result<()> {
        let (Some(token), Some(core)) = (self.token.get(), self.core.upgrade()) else {
            return Ok(());
        };

        core.reactor.rewatch(self.fd, token, self.interest())
    }

    /// Unregisters the watch. Idempotent.
    pub(crate) fn teardown(&self) {
        let Some(token) = self.token.take() else {
            return;
        };

        if let Some(core) = self.core.upgrade() {
            if let Err(err) = core.reactor.unwatch(self.fd, token) {
                debug!(fd = self.fd, token, error = %err, "unwatch failed");
            }
        }

        debug!(fd = self.fd, token, "readiness watch torn down");
    }
}

/// Guard returned by [`ReadinessWatch::arm`].
pub(crate) struct ArmedInterest<'a> {
    watch: &'a ReadinessWatch,
    interest: Interest,
}

impl Drop for ArmedInterest<'_> {
    fn drop(&mut self) {
        self.watch.adjust(self.interest, |n| n - 1);

        if let Err(err) = self.watch.sync() {
            warn!(fd = self.watch.fd, error = %err, "failed to drop readiness interest");
        }
    }
}
