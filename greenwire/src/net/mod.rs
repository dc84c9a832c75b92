//! Concrete transports.
//!
//! [`DatagramTransport`] implements [`Transport`](crate::transport::Transport)
//! over a non-blocking Unix datagram socket, one datagram per frame.
//! Wrap it in a [`GreenSocket`](crate::GreenSocket) to use it from
//! cooperative tasks.

mod datagram;

pub use datagram::{DEFAULT_MAX_FRAME, DatagramTransport};
