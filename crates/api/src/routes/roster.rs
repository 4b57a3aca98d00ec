//! Roster endpoint handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::DisplayMode;
use domain::services::{RosterView, StatusNotification};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_roster_load, record_roster_snapshot};

/// Query parameters for listing the roster.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    /// Case-insensitive substring matched against names, group, location and email.
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_search_query"))]
    pub q: String,

    #[serde(default)]
    pub mode: DisplayMode,
}

/// Result of an explicit reload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryResponse {
    pub outcome: &'static str,
    pub roster: RosterView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsResponse {
    pub notifications: Vec<StatusNotification>,
    pub count: usize,
}

/// Filtered and sorted roster with loading, error and subscription state.
///
/// GET /api/v1/roster?q=&mode=all|withLocationOnly
pub async fn get_roster(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<RosterView>, ApiError> {
    query.validate()?;

    let snapshot = state.session.snapshot();
    let health = state.session.health();
    record_roster_snapshot(&snapshot, health);

    Ok(Json(RosterView::from_snapshot(
        &snapshot,
        &query.q,
        query.mode,
        health,
    )))
}

/// Reload the roster on user request.
///
/// Waits for the load to finish; a failure is reported in the returned
/// roster's `error`, not as an HTTP error.
///
/// POST /api/v1/roster/retry
pub async fn retry_roster(State(state): State<AppState>) -> Json<RetryResponse> {
    let outcome = state.session.retry().await;
    record_roster_load(outcome.as_str());
    tracing::info!(outcome = outcome.as_str(), "Roster retry finished");

    Json(RetryResponse {
        outcome: outcome.as_str(),
        roster: state.session.view("", DisplayMode::All),
    })
}

/// Take pending status notifications.
///
/// GET /api/v1/roster/notifications
pub async fn drain_notifications(State(state): State<AppState>) -> Json<NotificationsResponse> {
    let notifications = state.inbox.drain();
    Json(NotificationsResponse {
        count: notifications.len(),
        notifications,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_query_defaults() {
        let query: RosterQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.q, "");
        assert_eq!(query.mode, DisplayMode::All);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_roster_query_mode() {
        let query: RosterQuery =
            serde_json::from_str(r#"{"q":"dana","mode":"withLocationOnly"}"#).unwrap();
        assert_eq!(query.mode, DisplayMode::WithLocationOnly);
    }

    #[test]
    fn test_roster_query_too_long() {
        let query = RosterQuery {
            q: "x".repeat(500),
            mode: DisplayMode::All,
        };
        assert!(query.validate().is_err());
    }
}
