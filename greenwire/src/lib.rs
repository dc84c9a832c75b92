//! # Greenwire
//!
//! **Greenwire** turns non-blocking, readiness-driven message sockets into
//! blocking-style sockets shared by many cooperative tasks on one thread.
//!
//! A task calling [`GreenSocket::recv`] either gets a frame right away or is
//! parked until the reactor reports that the socket's descriptor changed
//! state. The whole thing runs on a small single-threaded runtime that ships
//! with the crate:
//!
//! - A **cooperative runtime** with a local scheduler, an epoll/kqueue reactor
//!   and timers
//! - **Readiness gates**, single-waiter signals opened from reactor callbacks
//! - A **watchdog** bounding every wait, so a dropped readiness edge costs a
//!   retry instead of a hung task
//! - **Batch coalescing** for multi-frame messages
//! - A ready-made [`DatagramTransport`](net::DatagramTransport) over Unix
//!   datagram sockets
//! - **Macros** `#[greenwire::main]`, `#[greenwire::test]` and `join!`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use greenwire::net::DatagramTransport;
//! use greenwire::transport::Flags;
//! use greenwire::{GreenSocket, task};
//!
//! #[greenwire::main]
//! async fn main() -> greenwire::Result<()> {
//!     let (a, b) = DatagramTransport::pair()?;
//!     let a = GreenSocket::new(a)?;
//!     let b = GreenSocket::new(b)?;
//!
//!     let echo = task::spawn(async move {
//!         let frames = b.recv_batch().await?;
//!         b.send_batch(frames).await
//!     });
//!
//!     a.send_batch(["hello", "world"]).await?;
//!     println!("{:?}", a.recv_batch().await?);
//!
//!     echo.await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`socket`] - The cooperative socket adapter and its configuration
//! - [`transport`] - The interface a socket implementation must provide
//! - [`net`] - Concrete transports
//! - [`sync`] - Readiness gates
//! - [`time`] - Sleep, timeout and elapsed-time measurement
//!
//! ## Environment
//!
//! [`SocketConfig::from_env`] (used by [`GreenSocket::new`]) reads
//! `GREENWIRE_WATCHDOG_MS` and `GREENWIRE_DEBUG_EVENTS`.

mod reactor;
mod runtime;
mod utils;

pub mod error;
pub mod net;
pub mod socket;
pub mod sync;
pub mod time;
pub mod transport;

pub use error::{Result, SocketError};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;
pub use socket::{GreenSocket, SocketConfig, SocketStats};

pub use greenwire_macros::*;

/// Items used by macro expansions. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use crate::runtime::join::MaybeDone;
}
