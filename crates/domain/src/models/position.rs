//! Device position domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::distance::Coordinates;
use validator::Validate;

/// Last known position of the viewing device, supplied by the location tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DevicePosition {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Horizontal accuracy in meters.
    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    pub captured_at: DateTime<Utc>,
}

impl DevicePosition {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            captured_at: Utc::now(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
