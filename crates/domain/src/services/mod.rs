//! Domain services for Safe Circle.
//!
//! Services contain the roster engine: loading, realtime reconciliation and
//! view derivation, written against the backend ports in [`backend`].

pub mod backend;
pub mod in_memory;
pub mod notification;
pub mod notification_window;
pub mod presentation;
pub mod reconciler;
pub mod roster_fetcher;
pub mod roster_loader;
pub mod roster_store;
pub mod session;
pub mod settings;

pub use backend::{FeedEvent, FeedStatus, IdentityProvider, RosterSource, StatusFeed};
pub use in_memory::{BackendStep, InMemoryBackend};
pub use notification::{
    MockStatusNotifier, NotificationResult, NotificationType, StatusNotification, StatusNotifier,
};
pub use notification_window::{NotificationWindow, DEFAULT_NOTIFICATION_WINDOW};
pub use presentation::{compare_entries, filter_and_sort, matches_query, RosterView};
pub use reconciler::{RealtimeReconciler, RealtimeSubscription};
pub use roster_fetcher::{reduce_latest, RosterFetcher};
pub use roster_loader::{LoadOutcome, RosterLoader};
pub use roster_store::{PatchOutcome, RosterStore};
pub use session::{RosterSession, SessionBackends};
pub use settings::RosterSettings;
