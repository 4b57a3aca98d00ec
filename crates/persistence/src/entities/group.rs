//! Group entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GroupEntity> for domain::models::Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            owner_id: entity.owner_id,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_entity_conversion() {
        let owner = Uuid::new_v4();
        let entity = GroupEntity {
            id: Uuid::new_v4(),
            name: "Family".to_string(),
            owner_id: owner,
            created_at: Utc::now(),
        };

        let group: domain::models::Group = entity.clone().into();
        assert_eq!(group.id, entity.id);
        assert_eq!(group.name, "Family");
        assert!(group.is_owned_by(owner));
    }
}
