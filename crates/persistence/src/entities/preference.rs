//! Preference entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{EntityId, Preference, UserId};
use sqlx::FromRow;

/// Database row mapping for the preferences table.
#[derive(Debug, Clone, FromRow)]
pub struct PreferenceEntity {
    pub id: i64,
    pub user_id: i64,
    pub entity_id: Option<i64>,
    pub options: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PreferenceEntity> for Preference {
    fn from(entity: PreferenceEntity) -> Self {
        Self {
            id: entity.id,
            user: UserId(entity.user_id),
            entity: entity.entity_id.map(EntityId),
            options: entity.options,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
