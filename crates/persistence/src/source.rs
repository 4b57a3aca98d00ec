//! Postgres implementation of the roster source port.

use domain::models::{Group, MemberWithGroup, SafetyStatus};
use domain::services::RosterSource;
use domain::BackendError;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::backend_error;
use crate::repositories::{GroupRepository, MemberRepository, SafetyStatusRepository};

/// Reads groups, members and status rows from the backend tables.
#[derive(Clone)]
pub struct PgRosterSource {
    groups: GroupRepository,
    members: MemberRepository,
    statuses: SafetyStatusRepository,
}

impl PgRosterSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            groups: GroupRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            statuses: SafetyStatusRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl RosterSource for PgRosterSource {
    async fn groups_owned_by(&self, owner_id: Uuid) -> Result<Vec<Group>, BackendError> {
        let rows = self
            .groups
            .find_owned_by(owner_id)
            .await
            .map_err(backend_error)?;
        debug!(owner_id = %owner_id, rows = rows.len(), "Loaded owned groups");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn members_in_groups(
        &self,
        group_ids: &[Uuid],
    ) -> Result<Vec<MemberWithGroup>, BackendError> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .members
            .find_by_groups(group_ids)
            .await
            .map_err(backend_error)?;
        debug!(groups = group_ids.len(), rows = rows.len(), "Loaded group members");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn statuses_for_members(
        &self,
        member_ids: &[Uuid],
    ) -> Result<Vec<SafetyStatus>, BackendError> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .statuses
            .find_by_members(member_ids)
            .await
            .map_err(backend_error)?;
        debug!(members = member_ids.len(), rows = rows.len(), "Loaded status rows");
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
