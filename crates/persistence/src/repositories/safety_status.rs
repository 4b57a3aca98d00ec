//! Safety status repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SafetyStatusEntity;
use crate::metrics::QueryTimer;

/// Repository for the append-only safety status log.
#[derive(Clone)]
pub struct SafetyStatusRepository {
    pool: PgPool,
}

impl SafetyStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find every status row reported for the given members.
    ///
    /// Rows are returned unreduced; picking the latest per member is up to
    /// the caller.
    pub async fn find_by_members(
        &self,
        member_ids: &[Uuid],
    ) -> Result<Vec<SafetyStatusEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_statuses_by_members");
        let result = sqlx::query_as::<_, SafetyStatusEntity>(
            r#"
            SELECT id, member_id, status, latitude, longitude, reported_at
            FROM safety_status
            WHERE member_id = ANY($1)
            "#,
        )
        .bind(member_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
