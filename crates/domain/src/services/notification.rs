//! User-facing notifications for roster updates.
//!
//! Provides the notification port used by the realtime reconciler and a mock
//! implementation for development and testing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::models::{RosterEntry, SafetyState};

/// Notification type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    StatusUpdated,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::StatusUpdated => write!(f, "status_updated"),
        }
    }
}

/// Notification raised when a member reports a new status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotification {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub member_id: Uuid,
    pub display_name: String,
    pub group_name: String,
    pub status: SafetyState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub formatted_elapsed: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusNotification {
    pub fn for_entry(entry: &RosterEntry, timestamp: DateTime<Utc>) -> Self {
        Self {
            notification_type: NotificationType::StatusUpdated,
            member_id: entry.member_id,
            display_name: entry.display_name.clone(),
            group_name: entry.group_name.clone(),
            status: entry.status,
            distance_km: entry.distance_km,
            formatted_elapsed: entry.formatted_elapsed.clone(),
            timestamp,
        }
    }

    /// One-line text for toasts and logs.
    pub fn headline(&self) -> String {
        match self.status {
            SafetyState::Safe => format!("{} reported safe", self.display_name),
            SafetyState::Unknown => format!("{} updated their status", self.display_name),
        }
    }
}

/// Result of a notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    /// Notification was delivered to the user surface.
    Sent,
    /// Delivery failed (non-blocking for roster updates).
    Failed(String),
    /// Notification was suppressed by the de-duplication window.
    Skipped,
}

/// Port for showing roster notifications to the user.
#[async_trait::async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn notify(&self, notification: StatusNotification) -> NotificationResult;
}

/// Mock notifier for development and testing.
///
/// Logs and records notifications without delivering them anywhere.
#[derive(Debug, Default)]
pub struct MockStatusNotifier {
    /// Whether to simulate failures for testing.
    pub simulate_failure: bool,
    sent: Mutex<Vec<StatusNotification>>,
}

impl MockStatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock notifier that simulates failures.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Notifications recorded so far.
    pub fn sent(&self) -> Vec<StatusNotification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl StatusNotifier for MockStatusNotifier {
    async fn notify(&self, notification: StatusNotification) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                member_id = %notification.member_id,
                "Mock notifier simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            member_id = %notification.member_id,
            status = %notification.status,
            "Mock: Would show status notification"
        );

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        NotificationResult::Sent
    }
}
