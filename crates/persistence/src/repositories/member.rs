//! Group member repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MemberWithGroupEntity;
use crate::metrics::QueryTimer;

/// Repository for group member reads.
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the members of the given groups, joined with their group's name.
    pub async fn find_by_groups(
        &self,
        group_ids: &[Uuid],
    ) -> Result<Vec<MemberWithGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_members_by_groups");
        let result = sqlx::query_as::<_, MemberWithGroupEntity>(
            r#"
            SELECT m.id, m.group_id, m.email, m.name, m.user_id, m.created_at,
                   g.name AS group_name
            FROM group_members m
            JOIN groups g ON g.id = m.group_id
            WHERE m.group_id = ANY($1)
            "#,
        )
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
