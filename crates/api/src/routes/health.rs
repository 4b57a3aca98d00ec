//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::SubscriptionHealth;
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub roster: RosterHealth,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    /// False when the service runs without a database pool.
    pub configured: bool,
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Roster engine status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterHealth {
    pub has_loaded: bool,
    pub is_loading: bool,
    pub entries: usize,
    pub subscription: SubscriptionHealth,
    pub signed_in: Option<bool>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn database_health(state: &AppState) -> DatabaseHealth {
    let Some(pool) = &state.pool else {
        return DatabaseHealth {
            configured: false,
            connected: false,
            latency_ms: None,
        };
    };

    match persistence::db::ping(pool).await {
        Ok(latency) => DatabaseHealth {
            configured: true,
            connected: true,
            latency_ms: Some(latency.as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            DatabaseHealth {
                configured: true,
                connected: false,
                latency_ms: None,
            }
        }
    }
}

impl DatabaseHealth {
    fn is_healthy(&self) -> bool {
        !self.configured || self.connected
    }
}

/// Full health check endpoint.
///
/// Reports database connectivity and the roster engine state. Unhealthy only
/// when a configured database is unreachable.
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = database_health(&state).await;
    let snapshot = state.session.snapshot();
    let healthy = database.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        roster: RosterHealth {
            has_loaded: snapshot.has_loaded,
            is_loading: snapshot.is_loading,
            entries: snapshot.entries.len(),
            subscription: state.session.health(),
            signed_in: state.auth.as_ref().map(|auth| auth.is_signed_in()),
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Ready while the session is running and any configured database answers.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if state.session.is_shut_down() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    if !database_health(&state).await.is_healthy() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(StatusResponse {
        status: "ready".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_health_without_pool_is_healthy() {
        let health = DatabaseHealth {
            configured: false,
            connected: false,
            latency_ms: None,
        };
        assert!(health.is_healthy());
    }

    #[test]
    fn test_database_health_unreachable_is_unhealthy() {
        let health = DatabaseHealth {
            configured: true,
            connected: false,
            latency_ms: None,
        };
        assert!(!health.is_healthy());
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            database: DatabaseHealth {
                configured: true,
                connected: true,
                latency_ms: Some(5),
            },
            roster: RosterHealth {
                has_loaded: true,
                is_loading: false,
                entries: 3,
                subscription: SubscriptionHealth::Connected,
                signed_in: None,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["database"]["latency_ms"], 5);
        assert_eq!(json["roster"]["subscription"], "connected");
        assert_eq!(json["roster"]["has_loaded"], true);
        assert!(json["roster"]["signed_in"].is_null());
    }
}
