//! Asynchronous task primitives.
//!
//! This module defines how the runtime represents, schedules and
//! completes tasks:
//! - a slab-backed local scheduler,
//! - `Send + Sync` wakers that only carry a task id,
//! - join handles for awaiting task completion.
//!
//! Most users will interact with this module through [`spawn`] and
//! [`JoinHandle`].

mod handle;
mod waker;

pub(crate) mod core;

pub(crate) use self::core::{ROOT, Scheduler};
pub(crate) use waker::ReadyQueue;

pub use self::core::spawn;
pub use handle::JoinHandle;
