//! Device position endpoint handler.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use domain::models::DevicePosition;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_roster_load;

/// Position reported by the device's location tracker.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Horizontal accuracy in meters.
    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    /// Capture time; defaults to the time of the request.
    pub captured_at: Option<DateTime<Utc>>,
}

impl From<UpdatePositionRequest> for DevicePosition {
    fn from(request: UpdatePositionRequest) -> Self {
        DevicePosition {
            latitude: request.latitude,
            longitude: request.longitude,
            accuracy: request.accuracy,
            captured_at: request.captured_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionResponse {
    /// True when the movement triggered a roster reload.
    pub reloaded: bool,
    /// Outcome of that reload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
}

/// Record the device position, reloading the roster on significant movement.
///
/// PUT /api/v1/position
pub async fn update_position(
    State(state): State<AppState>,
    Json(request): Json<UpdatePositionRequest>,
) -> Result<Json<UpdatePositionResponse>, ApiError> {
    request.validate()?;

    let outcome = state.session.update_position(request.into()).await;
    if let Some(outcome) = &outcome {
        record_roster_load(outcome.as_str());
    }

    Ok(Json(UpdatePositionResponse {
        reloaded: outcome.is_some(),
        outcome: outcome.as_ref().map(|o| o.as_str()),
    }))
}
