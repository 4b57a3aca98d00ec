//! Bulk load orchestration.
//!
//! Wraps [`RosterFetcher`] with the load deadline and the single identity
//! retry. Each fetch runs on its own task so a deadline never discards a late
//! response; only a newer load or teardown stops it from publishing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::roster_fetcher::RosterFetcher;
use super::roster_store::RosterStore;
use super::settings::RosterSettings;
use crate::error::RosterError;
use crate::models::{DevicePosition, RosterEntry};

/// How a single load attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Roster published with this many entries.
    Loaded(usize),
    /// The load chain failed; the previous roster was kept.
    Failed(RosterError),
    /// The deadline elapsed first. The fetch keeps running and publishes
    /// when it lands, unless a newer load or shutdown overtakes it.
    TimedOut,
    /// A newer load started before this one finished; nothing was published.
    Superseded,
    /// The owner shut down; nothing was published.
    Cancelled,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::Loaded(_) => "loaded",
            LoadOutcome::Failed(_) => "failed",
            LoadOutcome::TimedOut => "timed_out",
            LoadOutcome::Superseded => "superseded",
            LoadOutcome::Cancelled => "cancelled",
        }
    }
}

/// Runs bulk loads into a [`RosterStore`].
pub struct RosterLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    fetcher: RosterFetcher,
    store: RosterStore,
    settings: RosterSettings,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

impl RosterLoader {
    pub fn new(
        fetcher: RosterFetcher,
        store: RosterStore,
        settings: RosterSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                fetcher,
                store,
                settings,
                generation: AtomicU64::new(0),
                shutdown,
            }),
        }
    }

    pub fn store(&self) -> &RosterStore {
        &self.inner.store
    }

    /// Loads the roster and publishes it.
    ///
    /// Returns when the load settles or the deadline elapses, whichever is
    /// first. A deadline only clears the loading flag: the fetch runs on in
    /// the background and still publishes if it is the newest load. Only the
    /// most recently started load may publish; older loads that finish later
    /// report [`LoadOutcome::Superseded`].
    pub async fn load(&self) -> LoadOutcome {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return LoadOutcome::Cancelled;
        }

        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let position = inner.store.position();
        let limit = inner.settings.load_timeout;
        inner.store.begin_load();
        debug!(generation, has_position = position.is_some(), "Roster load started");

        let mut task = tokio::spawn(Arc::clone(inner).run(generation, position));

        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => {
                debug!(generation, "Roster load cancelled");
                LoadOutcome::Cancelled
            }
            joined = &mut task => match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(generation, error = %err, "Roster load task failed");
                    if inner.is_current(generation) {
                        inner.store.settle();
                    }
                    LoadOutcome::Cancelled
                }
            },
            _ = tokio::time::sleep(limit) => {
                if !inner.is_current(generation) {
                    return LoadOutcome::Superseded;
                }
                warn!(
                    generation,
                    timeout_secs = limit.as_secs(),
                    "Roster load timed out, waiting for late response"
                );
                inner.store.time_out(limit);
                LoadOutcome::TimedOut
            }
        }
    }
}

impl LoaderInner {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(self: Arc<Self>, generation: u64, position: Option<DevicePosition>) -> LoadOutcome {
        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return LoadOutcome::Cancelled,
            result = self.fetch_with_retry(position.as_ref()) => result,
        };

        if self.shutdown.is_cancelled() {
            return LoadOutcome::Cancelled;
        }
        if !self.is_current(generation) {
            debug!(generation, "Roster load superseded by a newer load");
            return LoadOutcome::Superseded;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(entries) => {
                let count = entries.len();
                self.store.publish(entries);
                info!(generation, entries = count, elapsed_ms, "Roster published");
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                warn!(
                    generation,
                    category = %err.category(),
                    error = %err,
                    elapsed_ms,
                    "Roster load failed"
                );
                self.store.fail(&err);
                LoadOutcome::Failed(err)
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        position: Option<&DevicePosition>,
    ) -> Result<Vec<RosterEntry>, RosterError> {
        match self.fetcher.fetch(position).await {
            Err(RosterError::AuthResolution(err)) => {
                warn!(
                    error = %err,
                    delay_ms = self.settings.auth_retry_delay.as_millis() as u64,
                    "Identity resolution failed, retrying once"
                );
                tokio::time::sleep(self.settings.auth_retry_delay).await;
                self.fetcher.fetch(position).await
            }
            other => other,
        }
    }
}
