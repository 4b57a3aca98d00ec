//! Time-windowed notification de-duplication.
//!
//! Keeps the last notification time per key; a key may notify again once the
//! window has elapsed since its previous notification.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Default window during which repeated updates for one member stay silent.
pub const DEFAULT_NOTIFICATION_WINDOW: Duration = Duration::from_secs(5);

/// Per-key expiring map of last-notified timestamps.
#[derive(Debug, Clone)]
pub struct NotificationWindow<K = uuid::Uuid> {
    window: chrono::Duration,
    last_notified: HashMap<K, DateTime<Utc>>,
}

impl<K: Eq + Hash + Clone> NotificationWindow<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::days(36_500)),
            last_notified: HashMap::new(),
        }
    }

    /// Pure predicate: would a notification for `key` at `now` be allowed?
    pub fn should_notify(&self, key: &K, now: DateTime<Utc>) -> bool {
        match self.last_notified.get(key) {
            Some(last) => now.signed_duration_since(*last) >= self.window,
            None => true,
        }
    }

    pub fn record(&mut self, key: K, now: DateTime<Utc>) {
        self.last_notified.insert(key, now);
    }

    /// Checks and records in one step. Returns true when the caller should notify.
    pub fn check_and_record(&mut self, key: K, now: DateTime<Utc>) -> bool {
        if self.should_notify(&key, now) {
            self.prune(now);
            self.record(key, now);
            true
        } else {
            false
        }
    }

    /// Drops keys whose window has expired.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.last_notified
            .retain(|_, last| now.signed_duration_since(*last) < window);
    }

    pub fn len(&self) -> usize {
        self.last_notified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_notified.is_empty()
    }
}

impl Default for NotificationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_WINDOW)
    }
}
