use crate::transport::Events;

use libc::{POLLERR, POLLHUP, POLLIN, POLLOUT, poll, pollfd};
use std::io;
use std::os::fd::RawFd;

/// Samples the current readiness of a descriptor without blocking.
///
/// Runs `poll(2)` with a zero timeout. Error and hang-up conditions
/// report both directions as ready so that any waiter retries its
/// operation and observes the failure itself.
pub(crate) fn sys_poll_events(fd: RawFd) -> io::Result<Events> {
    let mut pfd = pollfd {
        fd,
        events: POLLIN | POLLOUT,
        revents: 0,
    };

    loop {
        let rc = unsafe { poll(&mut pfd, 1, 0) };
        if rc >= 0 {
            break;
        }

        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }

    let failed = pfd.revents & (POLLERR | POLLHUP) != 0;

    Ok(Events {
        readable: pfd.revents & POLLIN != 0 || failed,
        writable: pfd.revents & POLLOUT != 0 || failed,
    })
}
