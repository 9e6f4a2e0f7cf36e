//! Storage contract for preferences.
//!
//! The PostgreSQL implementation lives in the persistence crate; the in-memory
//! store here backs development setups and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::PreferenceError;
use crate::models::{EntityId, Preference, PreferenceInput, UserId};

/// Durable mapping from (user, entity) to an options payload.
///
/// At most one row exists per (user, entity) pair. Implementations reject
/// unset references with `InvalidArgument` before touching storage.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Insert the preference, or overwrite the options of the row sharing its
    /// (user, entity) identity. Returns the stored row with its id populated.
    async fn upsert(&self, input: &PreferenceInput) -> Result<Preference, PreferenceError>;

    /// Look up the row for a (user, entity) pair. A miss is `Ok(None)`.
    async fn find_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<Option<Preference>, PreferenceError>;

    /// All preferences owned by a user, ordered by id.
    async fn find_by_user(&self, user: UserId) -> Result<Vec<Preference>, PreferenceError>;

    /// Delete the row for a (user, entity) pair. Returns whether a row existed.
    async fn delete_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<bool, PreferenceError>;

    /// Delete every preference that refers to an entity. Returns the count.
    async fn delete_by_entity(&self, entity: EntityId) -> Result<u64, PreferenceError>;
}

/// Rejects unset user references.
pub fn require_user(user: UserId) -> Result<(), PreferenceError> {
    if user.is_set() {
        Ok(())
    } else {
        Err(PreferenceError::invalid_argument(
            "User of the preference cannot be null",
        ))
    }
}

/// Rejects unset entity references.
pub fn require_entity(entity: EntityId) -> Result<(), PreferenceError> {
    if entity.is_set() {
        Ok(())
    } else {
        Err(PreferenceError::invalid_argument(
            "Entity of the preference cannot be null",
        ))
    }
}

type PreferenceKey = (UserId, Option<EntityId>);

/// In-memory preference store.
///
/// Ids are assigned sequentially starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    rows: RwLock<HashMap<PreferenceKey, Preference>>,
    last_id: AtomicI64,
    /// Whether to simulate storage failures for testing.
    pub simulate_failure: bool,
}

impl InMemoryPreferenceStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every storage access fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), PreferenceError> {
        if self.simulate_failure {
            tracing::warn!("In-memory preference store simulating failure");
            return Err(PreferenceError::Storage(sqlx::Error::Protocol(
                "simulated storage failure".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn upsert(&self, input: &PreferenceInput) -> Result<Preference, PreferenceError> {
        input.require_valid()?;
        self.check_available()?;

        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let row = rows
            .entry((input.user, input.entity))
            .and_modify(|existing| {
                existing.options = input.options.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| Preference {
                id: self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
                user: input.user,
                entity: input.entity,
                options: input.options.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(row.clone())
    }

    async fn find_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<Option<Preference>, PreferenceError> {
        require_user(user)?;
        require_entity(entity)?;
        self.check_available()?;

        Ok(self.rows.read().await.get(&(user, Some(entity))).cloned())
    }

    async fn find_by_user(&self, user: UserId) -> Result<Vec<Preference>, PreferenceError> {
        require_user(user)?;
        self.check_available()?;

        let mut found: Vec<Preference> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| p.user == user)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id);
        Ok(found)
    }

    async fn delete_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<bool, PreferenceError> {
        require_user(user)?;
        require_entity(entity)?;
        self.check_available()?;

        Ok(self.rows.write().await.remove(&(user, Some(entity))).is_some())
    }

    async fn delete_by_entity(&self, entity: EntityId) -> Result<u64, PreferenceError> {
        require_entity(entity)?;
        self.check_available()?;

        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(_, e), _| *e != Some(entity));
        Ok((before - rows.len()) as u64)
    }
}
