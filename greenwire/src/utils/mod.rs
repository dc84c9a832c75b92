//! Internal utilities.
//!
//! This module provides low-level helpers used internally by the runtime:
//! a [`Slab`] allocator for indexed storage with reuse of freed slots,
//! and environment variable parsing for configuration overrides.

pub(crate) mod env;
mod slab;

pub(crate) use slab::Slab;
