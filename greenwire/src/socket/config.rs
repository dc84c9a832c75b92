use crate::utils::env::{env_get_bool, env_get_opt};

use std::time::Duration;

/// Default upper bound on a single readiness wait.
///
/// Some readiness drivers occasionally drop an edge. When this bound
/// expires the waiter retries its operation instead of hanging.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_millis(11_600);

/// Environment variable overriding the watchdog bound, in milliseconds.
/// `0` disables the bound.
pub const WATCHDOG_ENV: &str = "GREENWIRE_WATCHDOG_MS";

/// Environment variable enabling missed-event diagnostics.
pub const DIAGNOSTICS_ENV: &str = "GREENWIRE_DEBUG_EVENTS";

/// Per-socket configuration.
///
/// # Example
/// ```rust,ignore
/// let config = SocketConfig::new()
///     .watchdog(Some(Duration::from_secs(2)))
///     .diagnostics(true);
/// let socket = GreenSocket::with_config(transport, config)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConfig {
    watchdog: Option<Duration>,
    diagnostics: bool,
}

impl SocketConfig {
    /// Watchdog at [`DEFAULT_WATCHDOG`], diagnostics off.
    pub fn new() -> Self {
        Self {
            watchdog: Some(DEFAULT_WATCHDOG),
            diagnostics: false,
        }
    }

    /// Defaults, overridden by `GREENWIRE_WATCHDOG_MS` and
    /// `GREENWIRE_DEBUG_EVENTS` when set. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Some(ms) = env_get_opt::<u64>(WATCHDOG_ENV) {
            config.watchdog = (ms > 0).then(|| Duration::from_millis(ms));
        }

        config.diagnostics = env_get_bool(DIAGNOSTICS_ENV, config.diagnostics);
        config
    }

    /// Sets the watchdog bound. `None` lets waits block until signaled.
    pub fn watchdog(mut self, bound: Option<Duration>) -> Self {
        self.watchdog = bound;
        self
    }

    /// Enables logging of suspected missed readiness events.
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn watchdog_bound(&self) -> Option<Duration> {
        self.watchdog
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self::new()
    }
}
