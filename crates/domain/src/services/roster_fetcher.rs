//! Bulk roster loading.
//!
//! Resolves the viewer, discovers the groups they own, loads members and their
//! status log, and joins everything into roster entries. Each step depends on
//! the previous one, so the chain is strictly sequential.

use chrono::Utc;
use shared::relative_time::Locale;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::backend::{IdentityProvider, RosterSource};
use crate::error::RosterError;
use crate::models::{DevicePosition, RosterEntry, SafetyStatus};

/// Builds the full roster for the current identity.
pub struct RosterFetcher {
    identity: Arc<dyn IdentityProvider>,
    source: Arc<dyn RosterSource>,
    locale: Locale,
}

impl RosterFetcher {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        source: Arc<dyn RosterSource>,
        locale: Locale,
    ) -> Self {
        Self {
            identity,
            source,
            locale,
        }
    }

    /// Runs the load chain.
    ///
    /// Returns an empty roster, not an error, when nobody is signed in or the
    /// identity owns no groups or members.
    pub async fn fetch(
        &self,
        position: Option<&DevicePosition>,
    ) -> Result<Vec<RosterEntry>, RosterError> {
        let Some(identity) = self
            .identity
            .current_identity()
            .await
            .map_err(RosterError::AuthResolution)?
        else {
            debug!("No signed-in identity; roster is empty");
            return Ok(Vec::new());
        };

        let groups = self
            .source
            .groups_owned_by(identity.id)
            .await
            .map_err(RosterError::GroupLoad)?;
        if groups.is_empty() {
            debug!(identity_id = %identity.id, "Identity owns no groups");
            return Ok(Vec::new());
        }

        let group_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
        let members = self
            .source
            .members_in_groups(&group_ids)
            .await
            .map_err(RosterError::MemberLoad)?;
        if members.is_empty() {
            debug!(identity_id = %identity.id, groups = groups.len(), "Owned groups have no members");
            return Ok(Vec::new());
        }

        let member_ids: Vec<Uuid> = members.iter().map(|m| m.member.id).collect();
        let statuses = self
            .source
            .statuses_for_members(&member_ids)
            .await
            .map_err(RosterError::StatusLoad)?;

        let status_rows = statuses.len();
        let latest = reduce_latest(statuses);
        let now = Utc::now();
        let entries: Vec<RosterEntry> = members
            .iter()
            .map(|member| {
                RosterEntry::build(
                    member,
                    latest.get(&member.member.id),
                    position,
                    self.locale,
                    now,
                )
            })
            .collect();

        info!(
            identity_id = %identity.id,
            groups = groups.len(),
            members = entries.len(),
            status_rows,
            "Roster loaded"
        );

        Ok(entries)
    }
}

/// Keeps the most recent status row per member.
///
/// A later row replaces the kept one only when its `reported_at` is strictly
/// greater, so exact ties keep the first row encountered.
pub fn reduce_latest(rows: Vec<SafetyStatus>) -> HashMap<Uuid, SafetyStatus> {
    let mut latest: HashMap<Uuid, SafetyStatus> = HashMap::new();
    for row in rows {
        match latest.get(&row.member_id) {
            Some(kept) if row.reported_at <= kept.reported_at => {}
            _ => {
                latest.insert(row.member_id, row);
            }
        }
    }
    latest
}
