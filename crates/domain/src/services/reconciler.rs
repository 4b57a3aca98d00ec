//! Realtime reconciliation of pushed status rows.
//!
//! Subscribes to the status feed, patches single roster entries as rows are
//! inserted, reports subscription health, and raises at most one user
//! notification per member per window.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{FeedEvent, FeedStatus, StatusFeed};
use super::notification::{NotificationResult, StatusNotification, StatusNotifier};
use super::notification_window::NotificationWindow;
use super::roster_store::{PatchOutcome, RosterStore};
use crate::error::RosterError;
use crate::models::{StatusInsertPayload, SubscriptionHealth};

/// Applies push updates from a [`StatusFeed`] to a [`RosterStore`].
pub struct RealtimeReconciler {
    feed: Arc<dyn StatusFeed>,
    store: RosterStore,
    notifier: Arc<dyn StatusNotifier>,
    window: Mutex<NotificationWindow>,
    active: Mutex<Option<ActiveSubscription>>,
    next_id: AtomicU64,
}

/// The subscription currently allowed to report health.
struct ActiveSubscription {
    id: u64,
    token: CancellationToken,
}

impl RealtimeReconciler {
    pub fn new(
        feed: Arc<dyn StatusFeed>,
        store: RosterStore,
        notifier: Arc<dyn StatusNotifier>,
        notification_window: Duration,
    ) -> Self {
        Self {
            feed,
            store,
            notifier,
            window: Mutex::new(NotificationWindow::new(notification_window)),
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Opens a subscription, tearing down any previous one first.
    ///
    /// `on_health` sees `connecting`, then `connected` and/or `disconnected`.
    /// It is never called again once the returned guard is torn down or a
    /// newer subscription replaces it. `on_health` runs under the reconciler's
    /// lock and must not subscribe or unsubscribe.
    pub fn subscribe<F>(self: &Arc<Self>, on_health: F) -> RealtimeSubscription
    where
        F: Fn(SubscriptionHealth) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActiveSubscription {
                id,
                token: token.clone(),
            });
        if let Some(previous) = previous {
            debug!(previous = previous.id, "Tearing down previous realtime subscription");
            previous.token.cancel();
        }

        let reconciler = Arc::clone(self);
        let reporter = HealthReporter::new(id, token.clone(), on_health);
        let handle = tokio::spawn(reconciler.run(reporter));

        RealtimeSubscription {
            token,
            handle: Some(handle),
        }
    }

    /// Tears down the active subscription, if any.
    pub fn unsubscribe(&self) {
        if let Some(active) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            active.token.cancel();
        }
    }

    async fn run<F>(self: Arc<Self>, mut health: HealthReporter<F>)
    where
        F: Fn(SubscriptionHealth) + Send + Sync + 'static,
    {
        let token = health.token.clone();
        health.emit(&self.active, SubscriptionHealth::Connecting);

        let subscribed = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            result = self.feed.subscribe() => result,
        };
        let mut events = match subscribed {
            Ok(events) => events,
            Err(err) => {
                let err = RosterError::Subscription(err);
                warn!(error = %err, "Could not open realtime subscription");
                health.emit(&self.active, SubscriptionHealth::Disconnected);
                return;
            }
        };

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Some(FeedEvent::Status(FeedStatus::Subscribed)) => {
                    info!("Realtime subscription connected");
                    health.emit(&self.active, SubscriptionHealth::Connected);
                }
                Some(FeedEvent::Status(status)) => {
                    warn!(?status, "Realtime subscription lost");
                    health.emit(&self.active, SubscriptionHealth::Disconnected);
                    break;
                }
                Some(FeedEvent::Insert(payload)) => {
                    if let Err(err) = self.handle_insert(payload).await {
                        warn!(error = %err, "Dropping push payload");
                    }
                }
                None => {
                    warn!("Realtime feed closed");
                    health.emit(&self.active, SubscriptionHealth::Disconnected);
                    break;
                }
            }
        }

        debug!("Realtime subscription ended");
    }

    /// Applies one inserted row to the roster.
    ///
    /// Rows for members not on the roster are ignored. Malformed payloads are
    /// returned as [`RosterError::MalformedPushPayload`] and change nothing.
    pub async fn handle_insert(
        &self,
        payload: serde_json::Value,
    ) -> Result<PatchOutcome, RosterError> {
        let now = Utc::now();
        let status = StatusInsertPayload::from_value(payload)?.into_status(now)?;
        let outcome = self.store.apply_status(&status, now);

        let entry = match &outcome {
            PatchOutcome::UnknownMember => {
                debug!(member_id = %status.member_id, "Ignoring status for member not on roster");
                return Ok(outcome);
            }
            PatchOutcome::Applied(entry) => Arc::clone(entry),
        };
        debug!(
            member_id = %entry.member_id,
            status = %entry.status,
            distance_km = ?entry.distance_km,
            "Roster entry patched"
        );

        let should_notify = self
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check_and_record(entry.member_id, now);
        if !should_notify {
            debug!(member_id = %entry.member_id, "Notification suppressed by window");
            return Ok(outcome);
        }

        let notification = StatusNotification::for_entry(&entry, now);
        if let NotificationResult::Failed(reason) = self.notifier.notify(notification).await {
            warn!(member_id = %entry.member_id, reason = %reason, "Status notification failed");
        }

        Ok(outcome)
    }
}

/// Emits health changes along the allowed transitions only.
struct HealthReporter<F> {
    id: u64,
    token: CancellationToken,
    current: Option<SubscriptionHealth>,
    callback: F,
}

impl<F: Fn(SubscriptionHealth)> HealthReporter<F> {
    fn new(id: u64, token: CancellationToken, callback: F) -> Self {
        Self {
            id,
            token,
            current: None,
            callback,
        }
    }

    /// Reports `next` if this subscription is still the active one.
    ///
    /// The check and the callback happen under `active`, so a replaced
    /// subscription can never report after its successor has.
    fn emit(&mut self, active: &Mutex<Option<ActiveSubscription>>, next: SubscriptionHealth) {
        let active = active.lock().unwrap_or_else(PoisonError::into_inner);
        let is_active = active.as_ref().is_some_and(|a| a.id == self.id);
        if !is_active || self.token.is_cancelled() {
            return;
        }
        let allowed = match self.current {
            None => true,
            Some(current) => current.can_transition_to(next),
        };
        if allowed {
            self.current = Some(next);
            (self.callback)(next);
        }
    }
}

/// Guard for a running realtime subscription.
///
/// Dropping it tears the subscription down.
pub struct RealtimeSubscription {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RealtimeSubscription {
    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits for the subscription task to exit.
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
