use super::Runtime;

use std::io;

/// Builder for configuring and creating a runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .event_capacity(128)
///     .build();
/// ```
pub struct RuntimeBuilder {
    /// Maximum number of readiness events drained per poll.
    event_capacity: usize,

    /// Initial number of task slots.
    task_capacity: usize,
}

impl RuntimeBuilder {
    /// Creates a new `RuntimeBuilder` with default configuration.
    pub fn new() -> Self {
        Self {
            event_capacity: 256,
            task_capacity: 64,
        }
    }

    /// Sets how many readiness events one poll may return.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn event_capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "event_capacity must be > 0");

        self.event_capacity = n;
        self
    }

    /// Sets the number of task slots allocated up front.
    pub fn task_capacity(mut self, n: usize) -> Self {
        self.task_capacity = n;
        self
    }

    /// Builds the runtime, returning the OS error if the poller
    /// cannot be created.
    pub fn try_build(self) -> io::Result<Runtime> {
        Runtime::new(self.event_capacity, self.task_capacity)
    }

    /// Builds the runtime with the configured options.
    ///
    /// # Panics
    ///
    /// Panics if the OS poller cannot be created.
    pub fn build(self) -> Runtime {
        match self.try_build() {
            Ok(runtime) => runtime,
            Err(err) => panic!("failed to build greenwire runtime: {err}"),
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
