//! Group member domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A roster entry inside a group, identified by email.
///
/// A member may be linked to an identity once that identity reports a status
/// with a matching email. The link is maintained by the backend; roster logic
/// always keys on `id`, never on `linked_user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub group_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub linked_user_id: Option<Uuid>,
}

impl Member {
    /// Display name, falling back to the email address when no name is set.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// A member joined with the name of its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithGroup {
    #[serde(flatten)]
    pub member: Member,
    pub group_name: String,
}
