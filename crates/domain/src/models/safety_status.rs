//! Safety status domain models.
//!
//! Status reports are append-only; for roster purposes only the most recent
//! report per member matters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::distance::Coordinates;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::RosterError;

/// Reported safety state of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyState {
    Safe,
    #[default]
    Unknown,
}

impl SafetyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyState::Safe => "safe",
            SafetyState::Unknown => "unknown",
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyState::Safe)
    }

    /// Lenient mapping for values stored by other clients.
    ///
    /// Anything other than `safe` is shown as `unknown`.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for SafetyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Ok(SafetyState::Safe),
            "unknown" => Ok(SafetyState::Unknown),
            _ => Err(format!("Invalid safety state: {}", s)),
        }
    }
}

impl fmt::Display for SafetyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the safety status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyStatus {
    pub id: i64,
    pub member_id: Uuid,
    pub status: SafetyState,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reported_at: DateTime<Utc>,
}

impl SafetyStatus {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }
}

/// Raw insert event as delivered by the push feed.
///
/// Every field is optional so that malformed payloads can be reported
/// precisely instead of failing deserialization wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusInsertPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, alias = "memberId")]
    pub member_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, alias = "reportedAt")]
    pub reported_at: Option<DateTime<Utc>>,
}

impl StatusInsertPayload {
    /// Parses a push payload, unwrapping a `new`/`record` envelope when present.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RosterError> {
        let row = match value {
            serde_json::Value::Object(mut map) => {
                let envelope = ["new", "record"]
                    .iter()
                    .find_map(|key| match map.remove(*key) {
                        Some(inner @ serde_json::Value::Object(_)) => Some(inner),
                        _ => None,
                    });
                envelope.unwrap_or(serde_json::Value::Object(map))
            }
            other => {
                return Err(RosterError::MalformedPushPayload(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        serde_json::from_value(row).map_err(|e| RosterError::MalformedPushPayload(e.to_string()))
    }

    /// Converts the payload into a status row.
    ///
    /// `received_at` stands in for a missing report timestamp.
    pub fn into_status(self, received_at: DateTime<Utc>) -> Result<SafetyStatus, RosterError> {
        let member_id = self
            .member_id
            .ok_or_else(|| RosterError::MalformedPushPayload("missing member_id".to_string()))?;

        shared::validation::validate_coordinate_pair(self.latitude, self.longitude).map_err(
            |e| {
                RosterError::MalformedPushPayload(
                    e.message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                )
            },
        )?;

        Ok(SafetyStatus {
            id: self.id.unwrap_or_default(),
            member_id,
            status: self
                .status
                .as_deref()
                .map(SafetyState::from_db)
                .unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            reported_at: self.reported_at.unwrap_or(received_at),
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
