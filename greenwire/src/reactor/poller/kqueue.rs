//! macOS `kqueue`-based poller implementation.
//!
//! Mirrors the `epoll` backend: filters are added without `EV_CLEAR`,
//! so readiness is level-triggered. Wake-ups go through an
//! `EVFILT_USER` event on the queue itself.

use super::common::{Interest, Notifier, timeout_ms};
use crate::reactor::event::Event;

use std::io;
use std::os::unix::io::RawFd;
use std::sync::Arc;
use std::time::Duration;
use std::ptr;

/// Identifier of the `EVFILT_USER` wake event.
const NOTIFY_IDENT: usize = usize::MAX;

/// macOS `kqueue` poller.
pub(crate) struct KqueuePoller {
    /// Reusable buffer for kernel events.
    events: Vec<libc::kevent>,

    /// Owns the kqueue descriptor.
    notifier: Arc<Notifier>,
}

fn change(ident: usize, filter: i16, flags: u16, fflags: u32, udata: usize) -> libc::kevent {
    libc::kevent {
        ident: ident as libc::uintptr_t,
        filter,
        flags,
        fflags,
        data: 0,
        udata: udata as *mut libc::c_void,
    }
}

fn submit(kq: RawFd, changes: &[libc::kevent]) -> io::Result<()> {
    let rc = unsafe {
        libc::kevent(
            kq,
            changes.as_ptr(),
            changes.len() as i32,
            ptr::null_mut(),
            0,
            ptr::null(),
        )
    };

    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

impl Notifier {
    /// Wake the poller by triggering the user event.
    pub(crate) fn notify(&self) {
        let kev = change(
            NOTIFY_IDENT,
            libc::EVFILT_USER,
            0,
            libc::NOTE_TRIGGER,
            NOTIFY_IDENT,
        );
        let _ = submit(self.0, &[kev]);
    }
}

impl KqueuePoller {
    /// Create the kqueue and register its wake-up event.
    pub(crate) fn new(capacity: usize) -> io::Result<Self> {
        let kq = unsafe { libc::kqueue() };
        if kq < 0 {
            return Err(io::Error::last_os_error());
        }

        let notifier = Arc::new(Notifier(kq));

        let kev = change(
            NOTIFY_IDENT,
            libc::EVFILT_USER,
            libc::EV_ADD | libc::EV_ENABLE | libc::EV_CLEAR,
            0,
            NOTIFY_IDENT,
        );
        submit(kq, &[kev])?;

        Ok(Self {
            events: Vec::with_capacity(capacity.max(1)),
            notifier,
        })
    }

    /// Return the poller notifier.
    pub(crate) fn notifier(&self) -> Arc<Notifier> {
        self.notifier.clone()
    }

    fn kq(&self) -> RawFd {
        self.notifier.0
    }

    /// Register a file descriptor with the poller.
    pub(crate) fn register(&self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        self.reregister(fd, token, interest)
    }

    /// Update interest flags for an already registered descriptor.
    ///
    /// Each direction maps to its own filter, so a disabled direction
    /// is removed rather than left registered.
    pub(crate) fn reregister(&self, fd: RawFd, token: usize, interest: Interest) -> io::Result<()> {
        let read = if interest.read {
            libc::EV_ADD | libc::EV_ENABLE
        } else {
            libc::EV_DELETE
        };
        let write = if interest.write {
            libc::EV_ADD | libc::EV_ENABLE
        } else {
            libc::EV_DELETE
        };

        let changes = [
            change(fd as usize, libc::EVFILT_READ, read, 0, token),
            change(fd as usize, libc::EVFILT_WRITE, write, 0, token),
        ];

        for kev in &changes {
            match submit(self.kq(), std::slice::from_ref(kev)) {
                Err(err) if err.raw_os_error() == Some(libc::ENOENT) => {}
                other => other?,
            }
        }

        Ok(())
    }

    /// Remove a file descriptor from the poller.
    pub(crate) fn deregister(&self, fd: RawFd) -> io::Result<()> {
        for filter in [libc::EVFILT_READ, libc::EVFILT_WRITE] {
            let kev = change(fd as usize, filter, libc::EV_DELETE, 0, 0);
            match submit(self.kq(), &[kev]) {
                Err(err) if err.raw_os_error() == Some(libc::ENOENT) => {}
                other => other?,
            }
        }

        Ok(())
    }

    /// Poll for I/O readiness events.
    pub(crate) fn poll(
        &mut self,
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        events.clear();

        let ts;
        let ts_ptr = match timeout_ms(timeout) {
            -1 => ptr::null(),
            ms => {
                ts = libc::timespec {
                    tv_sec: (ms / 1000) as libc::time_t,
                    tv_nsec: ((ms % 1000) * 1_000_000) as libc::c_long,
                };
                &ts as *const libc::timespec
            }
        };

        let n = unsafe {
            libc::kevent(
                self.kq(),
                ptr::null(),
                0,
                self.events.as_mut_ptr(),
                self.events.capacity() as i32,
                ts_ptr,
            )
        };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(err);
        }

        unsafe {
            self.events.set_len(n as usize);
        }

        for ev in &self.events {
            if ev.filter == libc::EVFILT_USER {
                continue;
            }

            let token = ev.udata as usize;
            let failed = ev.flags & (libc::EV_EOF | libc::EV_ERROR) != 0;

            let readable = ev.filter == libc::EVFILT_READ || failed;
            let writable = ev.filter == libc::EVFILT_WRITE || failed;

            // Read and write filters arrive as separate kevents.
            if let Some(e) = events.iter_mut().find(|e| e.token == token) {
                e.readable |= readable;
                e.writable |= writable;
            } else {
                events.push(Event {
                    token,
                    readable,
                    writable,
                });
            }
        }

        Ok(())
    }
}
