//! Timers driven by the runtime reactor.
//!
//! It includes:
//! - [`sleep`] for scheduling timers,
//! - [`timeout`] for bounding future execution time,
//! - [`instrumented`] for measuring how long a future took.
//!
//! The socket watchdog is built from [`timeout`] and [`instrumented`].

mod instrumented;
mod sleep;
mod timeout;

#[doc(inline)]
pub use instrumented::{Instrumented, instrumented};

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};
