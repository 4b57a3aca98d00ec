//! Group member entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Member, MemberWithGroup};
use sqlx::FromRow;
use uuid::Uuid;

/// A group_members row joined with its group's name.
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithGroupEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub group_name: String,
}

impl From<MemberWithGroupEntity> for MemberWithGroup {
    fn from(entity: MemberWithGroupEntity) -> Self {
        Self {
            member: Member {
                id: entity.id,
                group_id: entity.group_id,
                email: entity.email,
                name: entity.name,
                created_at: entity.created_at,
                linked_user_id: entity.user_id,
            },
            group_name: entity.group_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn entity(name: Option<&str>) -> MemberWithGroupEntity {
        MemberWithGroupEntity {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            email: SafeEmail().fake(),
            name: name.map(str::to_string),
            user_id: None,
            created_at: Utc::now(),
            group_name: "Neighbors".to_string(),
        }
    }

    #[test]
    fn test_member_entity_conversion() {
        let entity = entity(Some("Dana"));
        let member: MemberWithGroup = entity.clone().into();

        assert_eq!(member.member.id, entity.id);
        assert_eq!(member.member.group_id, entity.group_id);
        assert_eq!(member.group_name, "Neighbors");
        assert_eq!(member.member.display_name(), "Dana");
        assert!(member.member.linked_user_id.is_none());
    }

    #[test]
    fn test_member_without_name_displays_email() {
        let entity = entity(None);
        let member: MemberWithGroup = entity.clone().into();
        assert_eq!(member.member.display_name(), entity.email);
    }
}
