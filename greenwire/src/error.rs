//! Errors surfaced by cooperative sockets.

use std::io;
use thiserror::Error;

/// Error returned by [`GreenSocket`](crate::GreenSocket) operations.
///
/// A blocking-style call only ever fails with [`Closed`](Self::Closed)
/// or [`Transport`](Self::Transport). [`WouldBlock`](Self::WouldBlock)
/// is reported only to callers that asked for non-blocking behavior.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket is closed")]
    Closed,

    #[error("operation would block")]
    WouldBlock,

    #[error("transport error: {0}")]
    Transport(#[source] io::Error),
}

impl SocketError {
    pub fn is_closed(&self) -> bool {
        matches!(self, SocketError::Closed)
    }

    pub fn is_would_block(&self) -> bool {
        matches!(self, SocketError::WouldBlock)
    }
}

impl From<io::Error> for SocketError {
    fn from(err: io::Error) -> Self {
        SocketError::Transport(err)
    }
}

pub type Result<T, E = SocketError> = std::result::Result<T, E>;
