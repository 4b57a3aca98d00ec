//! Domain error types.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a backend adapter (identity service, database, push feed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while building or maintaining the roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Failed to resolve current identity: {0}")]
    AuthResolution(#[source] BackendError),

    #[error("Failed to load groups: {0}")]
    GroupLoad(#[source] BackendError),

    #[error("Failed to load group members: {0}")]
    MemberLoad(#[source] BackendError),

    #[error("Failed to load safety statuses: {0}")]
    StatusLoad(#[source] BackendError),

    #[error("Realtime subscription failed: {0}")]
    Subscription(#[source] BackendError),

    #[error("Malformed push payload: {0}")]
    MalformedPushPayload(String),

    #[error("Roster load timed out after {}s", .0.as_secs())]
    LoadTimeout(Duration),
}

impl RosterError {
    /// Category surfaced to the UI for load-chain failures.
    pub fn category(&self) -> LoadErrorCategory {
        match self {
            RosterError::AuthResolution(_) => LoadErrorCategory::Auth,
            RosterError::GroupLoad(_) => LoadErrorCategory::Groups,
            RosterError::MemberLoad(_) => LoadErrorCategory::Members,
            RosterError::StatusLoad(_) => LoadErrorCategory::Status,
            RosterError::Subscription(_) | RosterError::MalformedPushPayload(_) => {
                LoadErrorCategory::Realtime
            }
            RosterError::LoadTimeout(_) => LoadErrorCategory::Timeout,
        }
    }

    /// Returns true for errors that abort a bulk load and may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RosterError::MalformedPushPayload(_))
    }
}

/// Coarse category of a roster failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorCategory {
    Auth,
    Groups,
    Members,
    Status,
    Realtime,
    Timeout,
}

impl LoadErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadErrorCategory::Auth => "auth",
            LoadErrorCategory::Groups => "groups",
            LoadErrorCategory::Members => "members",
            LoadErrorCategory::Status => "status",
            LoadErrorCategory::Realtime => "realtime",
            LoadErrorCategory::Timeout => "timeout",
        }
    }

    /// Human-readable summary shown next to the roster.
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadErrorCategory::Auth => "Could not verify your sign-in. Please try again.",
            LoadErrorCategory::Groups => "Could not load your groups.",
            LoadErrorCategory::Members => "Could not load group members.",
            LoadErrorCategory::Status => "Could not load member safety statuses.",
            LoadErrorCategory::Realtime => "Live updates are unavailable.",
            LoadErrorCategory::Timeout => "Loading took too long. Please try again.",
        }
    }
}

impl fmt::Display for LoadErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded load failure, as exposed alongside the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
    pub category: LoadErrorCategory,
    pub message: String,
    pub detail: String,
}

impl From<&RosterError> for LoadFailure {
    fn from(err: &RosterError) -> Self {
        let category = err.category();
        Self {
            category,
            message: category.user_message().to_string(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let backend = BackendError::Request("boom".to_string());
        assert_eq!(
            RosterError::AuthResolution(backend.clone()).category(),
            LoadErrorCategory::Auth
        );
        assert_eq!(
            RosterError::GroupLoad(backend.clone()).category(),
            LoadErrorCategory::Groups
        );
        assert_eq!(
            RosterError::MemberLoad(backend.clone()).category(),
            LoadErrorCategory::Members
        );
        assert_eq!(
            RosterError::StatusLoad(backend).category(),
            LoadErrorCategory::Status
        );
        assert_eq!(
            RosterError::LoadTimeout(Duration::from_secs(10)).category(),
            LoadErrorCategory::Timeout
        );
    }

    #[test]
    fn test_error_display() {
        let err = RosterError::GroupLoad(BackendError::Unavailable("db down".to_string()));
        assert_eq!(
            err.to_string(),
            "Failed to load groups: backend unavailable: db down"
        );

        let timeout = RosterError::LoadTimeout(Duration::from_secs(10));
        assert_eq!(timeout.to_string(), "Roster load timed out after 10s");
    }

    #[test]
    fn test_load_failure_from_error() {
        let err = RosterError::MemberLoad(BackendError::Decode("bad row".to_string()));
        let failure = LoadFailure::from(&err);
        assert_eq!(failure.category, LoadErrorCategory::Members);
        assert_eq!(failure.message, "Could not load group members.");
        assert!(failure.detail.contains("bad row"));
    }

    #[test]
    fn test_malformed_payload_is_not_retryable() {
        assert!(!RosterError::MalformedPushPayload("missing member_id".into()).is_retryable());
        assert!(RosterError::LoadTimeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&LoadErrorCategory::Timeout).unwrap();
        assert_eq!(json, "\"timeout\"");
    }
}
