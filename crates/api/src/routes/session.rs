//! Sign-in session endpoint handlers.
//!
//! The viewer hands over the access token issued by the hosted identity
//! service. Accepting or dropping it emits an identity change, and the
//! roster session rebuilds for the new viewer in the background.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use domain::models::Identity;
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_session_change;
use crate::services::HostedAuthClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub identity: Identity,
}

fn auth_client(state: &AppState) -> Result<&Arc<HostedAuthClient>, ApiError> {
    state
        .auth
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Sign-in is not configured".to_string()))
}

/// Sign in with a bearer token.
///
/// PUT /api/v1/session
pub async fn sign_in(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
    };
    let auth = auth_client(&state)?;

    let identity = auth
        .sign_in(bearer.token())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Access token was rejected".to_string()))?;
    record_session_change("sign_in");

    Ok(Json(SessionResponse { identity }))
}

/// Sign out.
///
/// DELETE /api/v1/session
pub async fn sign_out(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    if auth_client(&state)?.sign_out() {
        record_session_change("sign_out");
    }
    Ok(StatusCode::NO_CONTENT)
}
