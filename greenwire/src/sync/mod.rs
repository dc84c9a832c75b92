//! Synchronization primitives for cooperative tasks.
//!
//! - [`ReadinessGate`]: a single-waiter signal that a reactor callback
//!   opens and a task waits on.
//!
//! ## Design notes
//!
//! - Primitives here are `!Send`; they coordinate tasks running on one
//!   runtime thread and need no locking.
//! - Signaling never blocks and never suspends, so it may happen inside
//!   reactor dispatch.

mod gate;

pub use gate::{ReadinessGate, Wait, WaitGuard};
