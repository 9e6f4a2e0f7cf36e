//! Preference repository for database operations.

use domain::models::{EntityId, Preference, PreferenceInput, UserId};
use domain::services::preference_store::{require_entity, require_user};
use domain::services::PreferenceStore;
use domain::PreferenceError;
use sqlx::PgPool;

use crate::entities::PreferenceEntity;
use crate::metrics::QueryTimer;

/// Repository for preference database operations.
///
/// Every call is a single statement, so it commits or fails as a whole.
/// Concurrent upserts for the same (user, entity) resolve last-writer-wins
/// through the `preferences_user_entity_unique` constraint.
#[derive(Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Creates a new PreferenceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a preference or overwrite the options of the existing row.
    pub async fn upsert_preference(
        &self,
        user_id: i64,
        entity_id: i64,
        options: &str,
    ) -> Result<PreferenceEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_preference");
        let result = sqlx::query_as::<_, PreferenceEntity>(
            r#"
            INSERT INTO preferences (user_id, entity_id, options)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, entity_id)
            DO UPDATE SET options = EXCLUDED.options, updated_at = NOW()
            RETURNING id, user_id, entity_id, options, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(entity_id)
        .bind(options)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find the preference for a (user, entity) pair.
    pub async fn find_preference(
        &self,
        user_id: i64,
        entity_id: i64,
    ) -> Result<Option<PreferenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_preference_by_user_and_entity");
        let result = sqlx::query_as::<_, PreferenceEntity>(
            r#"
            SELECT id, user_id, entity_id, options, created_at, updated_at
            FROM preferences
            WHERE user_id = $1 AND entity_id = $2
            "#,
        )
        .bind(user_id)
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List a user's preferences ordered by id.
    pub async fn list_user_preferences(
        &self,
        user_id: i64,
    ) -> Result<Vec<PreferenceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_user_preferences");
        let result = sqlx::query_as::<_, PreferenceEntity>(
            r#"
            SELECT id, user_id, entity_id, options, created_at, updated_at
            FROM preferences
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Delete the preference for a (user, entity) pair.
    /// Returns the number of deleted records.
    pub async fn delete_preference(&self, user_id: i64, entity_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_preference");
        let result = sqlx::query(
            r#"
            DELETE FROM preferences
            WHERE user_id = $1 AND entity_id = $2
            "#,
        )
        .bind(user_id)
        .bind(entity_id)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|r| r.rows_affected())
    }

    /// Delete all preferences attached to an entity.
    /// Returns the number of deleted records.
    pub async fn delete_entity_preferences(&self, entity_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_entity_preferences");
        let result = sqlx::query(
            r#"
            DELETE FROM preferences
            WHERE entity_id = $1
            "#,
        )
        .bind(entity_id)
        .execute(&self.pool)
        .await;
        timer.finish(result).map(|r| r.rows_affected())
    }
}

#[async_trait::async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn upsert(&self, input: &PreferenceInput) -> Result<Preference, PreferenceError> {
        input.require_valid()?;
        let entity = input.entity.ok_or_else(|| {
            PreferenceError::invalid_argument("Entity of the preference cannot be null")
        })?;

        let row = self
            .upsert_preference(input.user.0, entity.0, &input.options)
            .await?;
        Ok(row.into())
    }

    async fn find_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<Option<Preference>, PreferenceError> {
        require_user(user)?;
        require_entity(entity)?;

        let row = self.find_preference(user.0, entity.0).await?;
        Ok(row.map(Preference::from))
    }

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Preference>, PreferenceError> {
        require_user(user)?;

        let rows = self.list_user_preferences(user.0).await?;
        Ok(rows.into_iter().map(Preference::from).collect())
    }

    async fn delete_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<bool, PreferenceError> {
        require_user(user)?;
        require_entity(entity)?;

        let deleted = self.delete_preference(user.0, entity.0).await?;
        Ok(deleted > 0)
    }

    async fn delete_by_entity(&self, entity: EntityId) -> Result<u64, PreferenceError> {
        require_entity(entity)?;

        let deleted = self.delete_entity_preferences(entity.0).await?;
        if deleted > 0 {
            tracing::info!(entity = %entity, deleted, "Removed preferences for deleted entity");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // A lazy pool never connects until a query runs, so argument checks can be
    // exercised without a database.
    fn lazy_repository() -> PreferenceRepository {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .expect("lazy pool should build from a valid url");
        PreferenceRepository::new(pool)
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_entity_before_query() {
        let repo = lazy_repository();
        let input = PreferenceInput {
            user: UserId(1),
            entity: None,
            options: "{}".to_string(),
        };

        let err = repo.upsert(&input).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_upsert_rejects_nul_in_options_before_query() {
        let repo = lazy_repository();
        let input = PreferenceInput::new(UserId(1), EntityId(1), "a\0b");

        let err = repo.upsert(&input).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_find_rejects_unset_references_before_query() {
        let repo = lazy_repository();

        let err = repo
            .find_by_user_and_entity(UserId(0), EntityId(1))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = repo
            .find_by_user_and_entity(UserId(1), EntityId(0))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_delete_by_entity_rejects_unset_reference() {
        let repo = lazy_repository();
        let err = repo.delete_by_entity(EntityId(-4)).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
