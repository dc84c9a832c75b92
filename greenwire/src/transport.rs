//! The capability interface consumed by [`GreenSocket`](crate::GreenSocket).
//!
//! A [`Transport`] is any non-blocking message socket that exposes a
//! pollable descriptor. The adapter never blocks inside a transport
//! call; every attempt either completes, reports
//! [`Attempt::WouldBlock`], or fails.

use bytes::Bytes;
use std::io;
use std::ops::BitOr;
use std::os::fd::RawFd;
use std::time::Duration;

/// Outcome of a single non-blocking transport call.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The operation completed.
    Ready(T),

    /// The operation cannot make progress until readiness changes.
    WouldBlock,

    /// The operation failed for a reason other than would-block.
    Failed(io::Error),
}

impl<T> From<io::Result<T>> for Attempt<T> {
    fn from(result: io::Result<T>) -> Self {
        match result {
            Ok(value) => Attempt::Ready(value),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Attempt::WouldBlock,
            Err(err) => Attempt::Failed(err),
        }
    }
}

/// One frame of a possibly multi-frame message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,

    /// More frames of the same message follow.
    pub more: bool,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>, more: bool) -> Self {
        Self {
            payload: payload.into(),
            more,
        }
    }
}

/// Readiness bits of a socket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Events {
    pub readable: bool,
    pub writable: bool,
}

/// Per-call flags for [`GreenSocket::send`](crate::GreenSocket::send)
/// and [`GreenSocket::recv`](crate::GreenSocket::recv).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Make exactly one attempt and report would-block as an error.
    pub dont_wait: bool,

    /// More frames of the same message follow (send only).
    pub more: bool,
}

impl Flags {
    pub const NONE: Flags = Flags {
        dont_wait: false,
        more: false,
    };

    pub const DONT_WAIT: Flags = Flags {
        dont_wait: true,
        more: false,
    };

    pub const MORE: Flags = Flags {
        dont_wait: false,
        more: true,
    };
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags {
            dont_wait: self.dont_wait || rhs.dont_wait,
            more: self.more || rhs.more,
        }
    }
}

/// Direction of a transfer, selecting which readiness gate is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Socket options understood by the adapter.
///
/// Only a few carry adapter semantics (see
/// [`GreenSocket::set_option`](crate::GreenSocket::set_option)); the
/// rest are forwarded untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketOption {
    Subscribe,
    Unsubscribe,
    Events,
    Descriptor,
    ReceiveMore,
    SendTimeout,
    ReceiveTimeout,
    SendHighWaterMark,
    ReceiveHighWaterMark,
    Linger,
}

impl SocketOption {
    /// Send/receive timeouts, which cooperative sockets ignore.
    pub fn is_timeout(self) -> bool {
        matches!(self, SocketOption::SendTimeout | SocketOption::ReceiveTimeout)
    }

    /// Options whose change may alter the socket's readiness.
    pub fn changes_subscription(self) -> bool {
        matches!(self, SocketOption::Subscribe | SocketOption::Unsubscribe)
    }
}

/// Value of a [`SocketOption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i64),
    Bytes(Bytes),
    Events(Events),
}

/// A non-blocking message transport.
///
/// Implementations must never block. Readiness of
/// [`descriptor`](Self::descriptor) is sampled with `poll(2)` and
/// watched by the runtime reactor.
pub trait Transport {
    /// The descriptor whose readiness reflects this transport.
    fn descriptor(&self) -> RawFd;

    /// Whether the descriptor reports real writability.
    ///
    /// Signal-style descriptors that only ever become readable keep the
    /// default `false`; write waits then rely on read edges alone.
    fn tracks_writability(&self) -> bool {
        false
    }

    /// Attempts to send one frame.
    fn send(&mut self, frame: &[u8], more: bool) -> Attempt<()>;

    /// Attempts to receive one frame.
    fn recv(&mut self) -> Attempt<Frame>;

    /// Current readiness as reported by the transport itself.
    fn events(&self) -> io::Result<Events>;

    fn get_option(&self, option: SocketOption) -> io::Result<OptionValue>;

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> io::Result<()>;

    /// Closes the transport. Called at most once.
    fn close(&mut self, linger: Option<Duration>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_results_map_to_attempts() {
        let ready: Attempt<u8> = Ok(1).into();
        assert!(matches!(ready, Attempt::Ready(1)));

        let blocked: Attempt<u8> = Err(io::Error::from(io::ErrorKind::WouldBlock)).into();
        assert!(matches!(blocked, Attempt::WouldBlock));

        let failed: Attempt<u8> = Err(io::Error::from(io::ErrorKind::BrokenPipe)).into();
        assert!(matches!(failed, Attempt::Failed(e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn flags_combine() {
        assert_eq!(
            Flags::DONT_WAIT | Flags::MORE,
            Flags {
                dont_wait: true,
                more: true
            }
        );
        assert_eq!(Flags::default(), Flags::NONE);
    }
}
