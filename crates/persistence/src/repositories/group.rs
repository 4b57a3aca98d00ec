//! Group repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GroupEntity;
use crate::metrics::QueryTimer;

/// Repository for group reads.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find every group owned by `owner_id`.
    pub async fn find_owned_by(&self, owner_id: Uuid) -> Result<Vec<GroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_groups_owned_by");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM groups
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
