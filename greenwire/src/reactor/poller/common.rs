use std::os::fd::RawFd;
use std::time::Duration;

/// Readiness directions a descriptor is registered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Interest {
    pub(crate) read: bool,
    pub(crate) write: bool,
}

impl Interest {
    pub(crate) const READABLE: Interest = Interest {
        read: true,
        write: false,
    };

    pub(crate) const WRITABLE: Interest = Interest {
        read: false,
        write: true,
    };

    pub(crate) fn is_empty(self) -> bool {
        !self.read && !self.write
    }
}

/// Handle used to interrupt a blocking poll from any thread.
///
/// On Linux this wraps an `eventfd`; on macOS it carries the kqueue
/// descriptor and triggers an `EVFILT_USER` event. The notifier owns
/// its descriptor, since wakers may keep it alive past the poller.
pub(crate) struct Notifier(pub(crate) RawFd);

unsafe impl Send for Notifier {}
unsafe impl Sync for Notifier {}

impl Drop for Notifier {
    fn drop(&mut self) {
        unsafe { libc::close(self.0) };
    }
}

/// Converts an optional poll timeout into milliseconds.
///
/// Sub-millisecond remainders round up so a timer never fires early.
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(t) => {
            let ms = t.as_nanos().div_ceil(1_000_000);
            ms.min(i32::MAX as u128) as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::timeout_ms;
    use std::time::Duration;

    #[test]
    fn rounds_up_partial_milliseconds() {
        assert_eq!(timeout_ms(None), -1);
        assert_eq!(timeout_ms(Some(Duration::ZERO)), 0);
        assert_eq!(timeout_ms(Some(Duration::from_micros(1))), 1);
        assert_eq!(timeout_ms(Some(Duration::from_micros(1500))), 2);
        assert_eq!(timeout_ms(Some(Duration::from_secs(u64::MAX))), i32::MAX);
    }
}
