//! Platform-specific I/O poller abstraction.
//!
//! This module provides a unified interface over `epoll` (Linux) and
//! `kqueue` (macOS). The poller is used by the reactor to:
//! - wait for readiness on watched descriptors,
//! - sleep until the next timer deadline,
//! - get interrupted when a task is woken from another thread.
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system.

pub(crate) mod common;

pub(crate) use common::{Interest, Notifier};

#[cfg(target_os = "macos")]
mod kqueue;

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(target_os = "macos")]
pub(crate) type Poller = kqueue::KqueuePoller;

#[cfg(target_os = "linux")]
pub(crate) type Poller = epoll::EpollPoller;

#[cfg(unix)]
pub(crate) mod unix;

#[cfg(unix)]
pub(crate) use unix as platform;
