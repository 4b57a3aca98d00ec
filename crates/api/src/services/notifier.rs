//! Notification inbox polled by the UI.

use domain::services::{NotificationResult, StatusNotification, StatusNotifier};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Keeps the most recent status notifications until the UI drains them.
///
/// When full, the oldest notification is dropped to make room.
#[derive(Debug)]
pub struct InboxNotifier {
    capacity: usize,
    pending: Mutex<VecDeque<StatusNotification>>,
}

impl InboxNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<StatusNotification> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl StatusNotifier for InboxNotifier {
    async fn notify(&self, notification: StatusNotification) -> NotificationResult {
        tracing::info!(
            member_id = %notification.member_id,
            status = %notification.status.as_str(),
            "{}",
            notification.headline()
        );

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.len() == self.capacity {
            pending.pop_front();
            metrics::counter!("roster_notifications_dropped_total").increment(1);
        }
        pending.push_back(notification);
        NotificationResult::Sent
    }
}
