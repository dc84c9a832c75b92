//! Core runtime components.
//!
//! This module contains the single-threaded cooperative runtime:
//! - a local scheduler for `!Send` tasks,
//! - the thread-local context through which primitives find the
//!   reactor,
//! - cooperative yielding.
//!
//! Most users only touch [`RuntimeBuilder`], [`Runtime::block_on`] and
//! [`task::spawn`].

mod core;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod join;
pub(crate) mod yield_now;

pub mod task;

pub(crate) use self::core::Core;
pub use self::core::Runtime;
