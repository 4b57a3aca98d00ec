//! Roster session lifecycle.
//!
//! Owns the roster cell, the loader and the reconciler for one signed-in
//! viewer. Reloads on identity changes, significant device movement and
//! explicit retries; keeps exactly one realtime subscription open.

use shared::distance::has_moved_significantly;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backend::{IdentityProvider, RosterSource, StatusFeed};
use super::notification::StatusNotifier;
use super::presentation::RosterView;
use super::reconciler::{RealtimeReconciler, RealtimeSubscription};
use super::roster_fetcher::RosterFetcher;
use super::roster_loader::{LoadOutcome, RosterLoader};
use super::roster_store::RosterStore;
use super::settings::RosterSettings;
use crate::models::{DevicePosition, DisplayMode, RosterSnapshot, SubscriptionHealth};

/// Backend adapters a session runs against.
#[derive(Clone)]
pub struct SessionBackends {
    pub identity: Arc<dyn IdentityProvider>,
    pub source: Arc<dyn RosterSource>,
    pub feed: Arc<dyn StatusFeed>,
    pub notifier: Arc<dyn StatusNotifier>,
}

pub struct RosterSession {
    store: RosterStore,
    loader: RosterLoader,
    reconciler: Arc<RealtimeReconciler>,
    identity: Arc<dyn IdentityProvider>,
    health: Arc<watch::Sender<SubscriptionHealth>>,
    cancel: CancellationToken,
    subscription: Mutex<Option<RealtimeSubscription>>,
    load_anchor: Mutex<Option<DevicePosition>>,
}

impl RosterSession {
    pub fn new(backends: SessionBackends, settings: RosterSettings) -> Self {
        let store = RosterStore::new(settings.locale);
        let cancel = CancellationToken::new();
        let fetcher = RosterFetcher::new(
            Arc::clone(&backends.identity),
            backends.source,
            settings.locale,
        );
        let reconciler = Arc::new(RealtimeReconciler::new(
            backends.feed,
            store.clone(),
            backends.notifier,
            settings.notification_window,
        ));
        let loader = RosterLoader::new(fetcher, store.clone(), settings, cancel.clone());
        let (health, _) = watch::channel(SubscriptionHealth::default());

        Self {
            store,
            loader,
            reconciler,
            identity: backends.identity,
            health: Arc::new(health),
            cancel,
            subscription: Mutex::new(None),
            load_anchor: Mutex::new(None),
        }
    }

    /// Subscribes to push updates, runs the initial load and starts
    /// following identity changes.
    ///
    /// Every identity change re-subscribes and reloads. The returned task
    /// ends on [`shutdown`](Self::shutdown).
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.identity.identity_changes();
        self.resubscribe();

        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.reload().await;

            loop {
                let change = tokio::select! {
                    biased;
                    _ = session.cancel.cancelled() => break,
                    change = changes.recv() => change,
                };

                match change {
                    Ok(change) => {
                        info!(identity_id = ?change.identity_id(), "Identity changed, rebuilding roster");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed identity changes, rebuilding roster");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Identity change stream closed");
                        break;
                    }
                }

                session.resubscribe();
                session.reload().await;
            }
        })
    }

    /// Replaces the realtime subscription with a fresh one.
    pub fn resubscribe(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let health = Arc::clone(&self.health);
        let subscription = self.reconciler.subscribe(move |state| {
            health.send_replace(state);
        });
        *self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);
    }

    pub async fn reload(&self) -> LoadOutcome {
        self.loader.load().await
    }

    /// Explicit reload requested by the user.
    pub async fn retry(&self) -> LoadOutcome {
        info!("Roster retry requested");
        self.loader.load().await
    }

    /// Records the device position and reloads when it moved far enough.
    ///
    /// The position is always kept for push patches. Movement is measured
    /// against the position of the last load this method triggered; returns
    /// `None` when no reload ran.
    pub async fn update_position(&self, position: DevicePosition) -> Option<LoadOutcome> {
        self.store.set_position(position);

        let moved = {
            let mut anchor = self
                .load_anchor
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let moved = has_moved_significantly(
                Some(position.coordinates()),
                anchor.map(|p| p.coordinates()),
            );
            if moved {
                *anchor = Some(position);
            }
            moved
        };

        if !moved {
            debug!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Position change below movement threshold"
            );
            return None;
        }

        Some(self.loader.load().await)
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        self.store.snapshot()
    }

    /// Filtered and sorted roster for list and map views.
    pub fn view(&self, query: &str, mode: DisplayMode) -> RosterView {
        RosterView::from_snapshot(&self.store.snapshot(), query, mode, self.health())
    }

    pub fn health(&self) -> SubscriptionHealth {
        *self.health.borrow()
    }

    pub fn watch_health(&self) -> watch::Receiver<SubscriptionHealth> {
        self.health.subscribe()
    }

    pub fn watch_snapshots(&self) -> watch::Receiver<RosterSnapshot> {
        self.store.subscribe()
    }

    pub fn position(&self) -> Option<DevicePosition> {
        self.store.position()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels in-flight loads and tears down the realtime subscription.
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        info!("Shutting down roster session");
        self.cancel.cancel();
        self.reconciler.unsubscribe();
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.health.send_replace(SubscriptionHealth::Disconnected);
    }
}
