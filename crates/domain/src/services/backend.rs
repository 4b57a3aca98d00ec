//! Ports to the hosted backend.
//!
//! The roster engine never talks to the network directly; adapters for the
//! identity service, the relational tables and the push feed implement these
//! traits.

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::error::BackendError;
use crate::models::{Group, Identity, IdentityChange, MemberWithGroup, SafetyStatus};

/// Resolves the signed-in identity.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the current identity, or `None` when nobody is signed in.
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError>;

    /// Stream of sign-in / sign-out transitions.
    fn identity_changes(&self) -> broadcast::Receiver<IdentityChange>;
}

/// Relational reads backing the roster.
///
/// Row order of the returned sets is not significant.
#[async_trait::async_trait]
pub trait RosterSource: Send + Sync {
    async fn groups_owned_by(&self, owner_id: Uuid) -> Result<Vec<Group>, BackendError>;

    /// Members of the given groups, joined with their group name.
    async fn members_in_groups(
        &self,
        group_ids: &[Uuid],
    ) -> Result<Vec<MemberWithGroup>, BackendError>;

    /// Every status row reported for the given members.
    async fn statuses_for_members(
        &self,
        member_ids: &[Uuid],
    ) -> Result<Vec<SafetyStatus>, BackendError>;
}

/// Lifecycle signal from the push feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// The feed acknowledged the subscription.
    Subscribed,
    ChannelError(String),
    TimedOut,
    Closed,
}

/// One event delivered by the push feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Status(FeedStatus),
    /// A newly inserted safety status row, as raw JSON.
    Insert(serde_json::Value),
}

/// Push subscription to inserted safety status rows.
///
/// Dropping the returned receiver tears the subscription down; adapters must
/// stop delivering once the receiver is gone.
#[async_trait::async_trait]
pub trait StatusFeed: Send + Sync {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedEvent>, BackendError>;
}
