//! Safety status entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{SafetyState, SafetyStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the safety_status table.
#[derive(Debug, Clone, FromRow)]
pub struct SafetyStatusEntity {
    pub id: i64,
    pub member_id: Uuid,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reported_at: DateTime<Utc>,
}

impl From<SafetyStatusEntity> for SafetyStatus {
    fn from(entity: SafetyStatusEntity) -> Self {
        Self {
            id: entity.id,
            member_id: entity.member_id,
            status: SafetyState::from_db(&entity.status),
            latitude: entity.latitude,
            longitude: entity.longitude,
            reported_at: entity.reported_at,
        }
    }
}
