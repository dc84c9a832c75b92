/// A readiness event reported by the poller.
///
/// Produced by the poller for each watched descriptor that became
/// ready and consumed by the reactor to run the matching watch
/// callback. The flags are informational: callbacks resample the
/// descriptor themselves.
pub(crate) struct Event {
    /// Token of the watch registered for the descriptor.
    pub(crate) token: usize,

    /// The descriptor is readable, or reported an error or hang-up.
    pub(crate) readable: bool,

    /// The descriptor is writable.
    pub(crate) writable: bool,
}
