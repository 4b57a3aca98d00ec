//! In-memory backend for development and testing.
//!
//! Implements every backend port against process-local state, with knobs for
//! simulated latency and failures.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use super::backend::{FeedEvent, FeedStatus, IdentityProvider, RosterSource, StatusFeed};
use crate::error::BackendError;
use crate::models::{
    Group, Identity, IdentityChange, Member, MemberWithGroup, SafetyState, SafetyStatus,
};

const FEED_BUFFER: usize = 64;
const IDENTITY_CHANGE_BUFFER: usize = 16;

/// A backend call, used to inject failures and inspect call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendStep {
    Identity,
    Groups,
    Members,
    Statuses,
    Subscribe,
}

impl fmt::Display for BackendStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendStep::Identity => "identity",
            BackendStep::Groups => "groups",
            BackendStep::Members => "members",
            BackendStep::Statuses => "statuses",
            BackendStep::Subscribe => "subscribe",
        };
        write!(f, "{}", name)
    }
}

#[derive(Default)]
struct State {
    identity: Option<Identity>,
    groups: Vec<Group>,
    members: Vec<MemberWithGroup>,
    statuses: Vec<SafetyStatus>,
    next_status_id: i64,
    failures: HashMap<BackendStep, usize>,
    latency: Duration,
    calls: Vec<BackendStep>,
    subscribers: Vec<mpsc::Sender<FeedEvent>>,
}

/// Process-local implementation of the identity, roster and feed ports.
pub struct InMemoryBackend {
    state: Mutex<State>,
    changes: broadcast::Sender<IdentityChange>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(IDENTITY_CHANGE_BUFFER);
        Self {
            state: Mutex::new(State::default()),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Signs `identity` in and emits an identity change.
    pub fn sign_in(&self, identity: Identity) {
        self.lock().identity = Some(identity.clone());
        let _ = self.changes.send(IdentityChange::SignedIn(identity));
    }

    pub fn sign_out(&self) {
        self.lock().identity = None;
        let _ = self.changes.send(IdentityChange::SignedOut);
    }

    pub fn add_group(&self, name: &str, owner_id: Uuid) -> Group {
        let group = Group {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            created_at: Utc::now(),
        };
        self.lock().groups.push(group.clone());
        group
    }

    pub fn add_member(&self, group: &Group, email: &str, name: Option<&str>) -> Member {
        let member = Member {
            id: Uuid::new_v4(),
            group_id: group.id,
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: Utc::now(),
            linked_user_id: None,
        };
        self.lock().members.push(MemberWithGroup {
            member: member.clone(),
            group_name: group.name.clone(),
        });
        member
    }

    /// Appends a status row to the log without publishing it on the feed.
    pub fn record_status(
        &self,
        member_id: Uuid,
        status: SafetyState,
        coordinates: Option<(f64, f64)>,
        reported_at: DateTime<Utc>,
    ) -> SafetyStatus {
        let mut state = self.lock();
        state.next_status_id += 1;
        let row = SafetyStatus {
            id: state.next_status_id,
            member_id,
            status,
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lon)| lon),
            reported_at,
        };
        state.statuses.push(row.clone());
        row
    }

    /// Makes the next `times` calls of `step` fail.
    pub fn fail_next(&self, step: BackendStep, times: usize) {
        self.lock().failures.insert(step, times);
    }

    /// Delays every backend call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<BackendStep> {
        self.lock().calls.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state.subscribers.len()
    }

    /// Delivers an insert event to every live subscriber.
    ///
    /// Returns the number of subscribers that accepted the event.
    pub fn push_insert(&self, payload: serde_json::Value) -> usize {
        self.broadcast(FeedEvent::Insert(payload))
    }

    /// Records the row and publishes it on the feed, like a database insert.
    pub fn insert_status(
        &self,
        member_id: Uuid,
        status: SafetyState,
        coordinates: Option<(f64, f64)>,
    ) -> SafetyStatus {
        let row = self.record_status(member_id, status, coordinates, Utc::now());
        let payload = serde_json::json!({
            "id": row.id,
            "member_id": row.member_id,
            "status": row.status.as_str(),
            "latitude": row.latitude,
            "longitude": row.longitude,
            "reported_at": row.reported_at,
        });
        self.push_insert(payload);
        row
    }

    pub fn push_feed_status(&self, status: FeedStatus) -> usize {
        self.broadcast(FeedEvent::Status(status))
    }

    /// Drops every subscriber sender, ending their streams.
    pub fn close_feed(&self) {
        self.lock().subscribers.clear();
    }

    fn broadcast(&self, event: FeedEvent) -> usize {
        let mut state = self.lock();
        state.subscribers.retain(|tx| !tx.is_closed());
        state
            .subscribers
            .iter()
            .filter(|tx| tx.try_send(event.clone()).is_ok())
            .count()
    }

    async fn enter(&self, step: BackendStep) -> Result<(), BackendError> {
        let (latency, fail) = {
            let mut state = self.lock();
            state.calls.push(step);
            let fail = match state.failures.get_mut(&step) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            (state.latency, fail)
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if fail {
            Err(BackendError::Unavailable(format!(
                "simulated {} failure",
                step
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        self.enter(BackendStep::Identity).await?;
        Ok(self.lock().identity.clone())
    }

    fn identity_changes(&self) -> broadcast::Receiver<IdentityChange> {
        self.changes.subscribe()
    }
}

#[async_trait::async_trait]
impl RosterSource for InMemoryBackend {
    async fn groups_owned_by(&self, owner_id: Uuid) -> Result<Vec<Group>, BackendError> {
        self.enter(BackendStep::Groups).await?;
        Ok(self
            .lock()
            .groups
            .iter()
            .filter(|g| g.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn members_in_groups(
        &self,
        group_ids: &[Uuid],
    ) -> Result<Vec<MemberWithGroup>, BackendError> {
        self.enter(BackendStep::Members).await?;
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| group_ids.contains(&m.member.group_id))
            .cloned()
            .collect())
    }

    async fn statuses_for_members(
        &self,
        member_ids: &[Uuid],
    ) -> Result<Vec<SafetyStatus>, BackendError> {
        self.enter(BackendStep::Statuses).await?;
        Ok(self
            .lock()
            .statuses
            .iter()
            .filter(|s| member_ids.contains(&s.member_id))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl StatusFeed for InMemoryBackend {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedEvent>, BackendError> {
        self.enter(BackendStep::Subscribe).await?;
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let _ = tx.try_send(FeedEvent::Status(FeedStatus::Subscribed));
        self.lock().subscribers.push(tx);
        Ok(rx)
    }
}
