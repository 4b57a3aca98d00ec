//! The single mutable roster cell.
//!
//! Every writer (bulk loads, push patches) goes through [`RosterStore`], which
//! publishes whole [`RosterSnapshot`] values over a watch channel so readers
//! never observe a half-built roster.

use chrono::{DateTime, Utc};
use shared::relative_time::Locale;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{LoadFailure, RosterError};
use crate::models::{DevicePosition, Roster, RosterEntry, RosterSnapshot, SafetyStatus};

/// Result of applying a pushed status row.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    /// The member's entry was replaced with this one.
    Applied(Arc<RosterEntry>),
    /// The member is not on the current roster; nothing changed.
    UnknownMember,
}

/// Shared handle to the roster cell and the latest device position.
#[derive(Clone)]
pub struct RosterStore {
    snapshot: watch::Sender<RosterSnapshot>,
    position: watch::Sender<Option<DevicePosition>>,
    locale: Locale,
}

impl RosterStore {
    pub fn new(locale: Locale) -> Self {
        let (snapshot, _) = watch::channel(RosterSnapshot::default());
        let (position, _) = watch::channel(None);
        Self {
            snapshot,
            position,
            locale,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RosterSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn position(&self) -> Option<DevicePosition> {
        *self.position.borrow()
    }

    pub fn set_position(&self, position: DevicePosition) {
        self.position.send_replace(Some(position));
    }

    /// Marks a bulk load as in progress. The current entries stay visible.
    pub fn begin_load(&self) {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.is_loading {
                return false;
            }
            snapshot.is_loading = true;
            true
        });
    }

    /// Replaces the roster wholesale with the result of a bulk load.
    pub fn publish(&self, entries: Vec<RosterEntry>) {
        let entries = Roster::new(entries);
        self.snapshot.send_modify(|snapshot| {
            *snapshot = RosterSnapshot {
                entries,
                is_loading: false,
                error: None,
                has_loaded: true,
            };
        });
    }

    /// Records a failed bulk load, keeping the previous entries.
    pub fn fail(&self, err: &RosterError) {
        let failure = LoadFailure::from(err);
        self.snapshot.send_modify(|snapshot| {
            snapshot.is_loading = false;
            snapshot.error = Some(failure);
        });
    }

    /// Ends a load that exceeded its deadline.
    ///
    /// The timeout is only reported as an error when no roster was ever
    /// loaded; otherwise the previous roster stays on screen silently.
    pub fn time_out(&self, limit: Duration) {
        let failure = LoadFailure::from(&RosterError::LoadTimeout(limit));
        self.snapshot.send_modify(|snapshot| {
            snapshot.is_loading = false;
            if !snapshot.has_loaded {
                snapshot.error = Some(failure);
            }
        });
    }

    /// Ends a load whose result was discarded without touching the roster.
    pub fn settle(&self) {
        self.snapshot.send_if_modified(|snapshot| {
            let was_loading = snapshot.is_loading;
            snapshot.is_loading = false;
            was_loading
        });
    }

    /// Replaces the entry of `status.member_id` with one built from `status`.
    ///
    /// Distance uses the latest device position; without one (or without row
    /// coordinates) the previous distance is kept. Unknown members leave the
    /// roster reference untouched and wake no receivers.
    pub fn apply_status(&self, status: &SafetyStatus, now: DateTime<Utc>) -> PatchOutcome {
        let position = self.position();
        let mut outcome = PatchOutcome::UnknownMember;

        self.snapshot.send_if_modified(|snapshot| {
            let Some(current) = snapshot.entries.get(status.member_id) else {
                return false;
            };
            let entry = Arc::new(current.with_status(status, position.as_ref(), self.locale, now));
            match snapshot.entries.replace_entry(status.member_id, Arc::clone(&entry)) {
                Some(patched) => {
                    snapshot.entries = patched;
                    outcome = PatchOutcome::Applied(entry);
                    true
                }
                None => false,
            }
        });

        outcome
    }

    /// Entry for `member_id` in the current roster.
    pub fn entry(&self, member_id: Uuid) -> Option<Arc<RosterEntry>> {
        self.snapshot.borrow().entries.get(member_id).cloned()
    }
}
