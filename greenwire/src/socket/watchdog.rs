use super::SocketConfig;
use crate::sync::ReadinessGate;
use crate::time::{instrumented, timeout};
use crate::transport::{Direction, Events};

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use tracing::warn;

/// How a guarded wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    Signaled,

    /// The bound expired. `missed_event` is set when diagnostics are on
    /// and the socket turned out to be ready all along.
    Expired { missed_event: bool },
}

/// Bounds readiness waits so a dropped edge cannot wedge a task.
///
/// Expiry is not an error: the gate is treated as signaled and the
/// caller simply retries its operation.
pub(crate) struct Watchdog {
    bound: Option<Duration>,
    diagnostics: bool,
}

impl Watchdog {
    pub(crate) fn new(config: &SocketConfig) -> Self {
        Self {
            bound: config.watchdog_bound(),
            diagnostics: config.diagnostics_enabled(),
        }
    }

    /// Closes `gate` and waits for it to be signaled or for the bound
    /// to expire. The gate is reopened on every exit path.
    ///
    /// `probe` reports the socket's own readiness and is only consulted
    /// for diagnostics after an expiry.
    pub(crate) async fn wait<P>(
        &self,
        gate: &ReadinessGate,
        fd: RawFd,
        direction: Direction,
        probe: P,
    ) -> WaitOutcome
    where
        P: FnOnce() -> io::Result<Events>,
    {
        let _guard = gate.arm();

        let Some(bound) = self.bound else {
            gate.wait().await;
            return WaitOutcome::Signaled;
        };

        let (result, elapsed) = instrumented(timeout(bound, gate.wait())).await;
        if result.is_ok() {
            return WaitOutcome::Signaled;
        }

        let missed_event = self.diagnostics
            && probe().is_ok_and(|events| match direction {
                Direction::Read => events.readable,
                Direction::Write => events.writable,
            });

        if missed_event {
            warn!(
                fd,
                ?direction,
                ?elapsed,
                "reactor may have missed a readiness event"
            );
        }

        WaitOutcome::Expired { missed_event }
    }
}
