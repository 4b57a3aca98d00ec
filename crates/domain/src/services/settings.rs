//! Tunables for the roster engine.

use shared::relative_time::Locale;
use std::time::Duration;

use super::notification_window::DEFAULT_NOTIFICATION_WINDOW;

/// Runtime settings shared by the fetcher, loader and reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSettings {
    /// Deadline after which a bulk load stops counting as in progress.
    pub load_timeout: Duration,
    /// Pause before the single automatic retry after an identity failure.
    pub auth_retry_delay: Duration,
    /// Per-member notification de-duplication window.
    pub notification_window: Duration,
    /// Locale for elapsed-time strings.
    pub locale: Locale,
}

impl RosterSettings {
    pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_AUTH_RETRY_DELAY: Duration = Duration::from_millis(1_000);
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            load_timeout: Self::DEFAULT_LOAD_TIMEOUT,
            auth_retry_delay: Self::DEFAULT_AUTH_RETRY_DELAY,
            notification_window: DEFAULT_NOTIFICATION_WINDOW,
            locale: Locale::default(),
        }
    }
}
