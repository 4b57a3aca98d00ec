//! Identity domain models.
//!
//! Identities are owned by the hosted identity provider and are read-only here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated end-user as known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

impl Identity {
    /// Name to show for this identity, falling back to the email address.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Sign-in state transition emitted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    SignedIn(Identity),
    SignedOut,
}

impl IdentityChange {
    pub fn identity_id(&self) -> Option<Uuid> {
        match self {
            IdentityChange::SignedIn(identity) => Some(identity.id),
            IdentityChange::SignedOut => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_falls_back_to_email() {
        let mut identity = Identity {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            display_name: None,
        };
        assert_eq!(identity.label(), "owner@example.com");

        identity.display_name = Some("  ".to_string());
        assert_eq!(identity.label(), "owner@example.com");

        identity.display_name = Some("Noa".to_string());
        assert_eq!(identity.label(), "Noa");
    }

    #[test]
    fn test_identity_change_id() {
        let id = Uuid::new_v4();
        let change = IdentityChange::SignedIn(Identity {
            id,
            email: "a@b.c".to_string(),
            display_name: None,
        });
        assert_eq!(change.identity_id(), Some(id));
        assert_eq!(IdentityChange::SignedOut.identity_id(), None);
    }
}
