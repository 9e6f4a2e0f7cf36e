//! Preference service.
//!
//! Thin facade over a [`PreferenceStore`] that enforces argument checks and
//! the service lifecycle before any storage access.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::Span;

use super::preference_store::{require_entity, require_user, PreferenceStore};
use crate::errors::PreferenceError;
use crate::models::{EntityId, Preference, PreferenceInput, UserId};

const STATE_UNINITIALIZED: u8 = 0;
const STATE_ACTIVE: u8 = 1;
const STATE_DISPOSED: u8 = 2;

/// Lifecycle of a [`PreferenceService`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Uninitialized,
    Active,
    Disposed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Uninitialized => write!(f, "uninitialized"),
            ServiceState::Active => write!(f, "active"),
            ServiceState::Disposed => write!(f, "disposed"),
        }
    }
}

impl From<u8> for ServiceState {
    fn from(raw: u8) -> Self {
        match raw {
            STATE_UNINITIALIZED => ServiceState::Uninitialized,
            STATE_ACTIVE => ServiceState::Active,
            _ => ServiceState::Disposed,
        }
    }
}

/// Service for reading and writing user preferences.
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
    state: AtomicU8,
    max_options_length: usize,
    span: Span,
}

impl PreferenceService {
    /// Create an uninitialized service over the given store.
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            state: AtomicU8::new(STATE_UNINITIALIZED),
            max_options_length: shared::validation::DEFAULT_MAX_OPTIONS_LENGTH,
            span: tracing::info_span!("preference_service"),
        }
    }

    /// Set the maximum options payload size in bytes.
    pub fn with_max_options_length(mut self, max_options_length: usize) -> Self {
        self.max_options_length = max_options_length;
        self
    }

    /// Emit this service's events under the given span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn max_options_length(&self) -> usize {
        self.max_options_length
    }

    pub fn state(&self) -> ServiceState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Move the service to `Active`. Calling it on an active service is a no-op.
    pub fn init(&self) -> Result<(), PreferenceError> {
        match self.state.compare_exchange(
            STATE_UNINITIALIZED,
            STATE_ACTIVE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::info!(parent: &self.span, "Preference service initialized");
                Ok(())
            }
            Err(STATE_ACTIVE) => Ok(()),
            Err(_) => Err(PreferenceError::IllegalState(
                "Preference service has been disposed".to_string(),
            )),
        }
    }

    /// Tear the service down. Every later operation fails with `IllegalState`.
    pub fn dispose(&self) {
        let previous = self.state.swap(STATE_DISPOSED, Ordering::AcqRel);
        if previous != STATE_DISPOSED {
            tracing::info!(parent: &self.span, "Preference service disposed");
        }
    }

    fn require_not_disposed(&self) -> Result<(), PreferenceError> {
        match self.state() {
            ServiceState::Active => Ok(()),
            ServiceState::Uninitialized => Err(PreferenceError::IllegalState(
                "Preference service has not been initialized".to_string(),
            )),
            ServiceState::Disposed => Err(PreferenceError::IllegalState(
                "Preference service has been disposed".to_string(),
            )),
        }
    }

    /// Insert or update the preference identified by the input's (user, entity).
    pub async fn update_preference(
        &self,
        input: PreferenceInput,
    ) -> Result<Preference, PreferenceError> {
        self.require_not_disposed()?;
        input.require_valid()?;
        shared::validation::validate_payload_length(&input.options, self.max_options_length)
            .map_err(|e| {
                PreferenceError::invalid_argument(
                    e.message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Options payload is too large".to_string()),
                )
            })?;

        let result = self.store.upsert(&input).await?;

        tracing::debug!(
            parent: &self.span,
            preference_id = result.id,
            user = %result.user,
            "Updated preference to: {}",
            result
        );

        Ok(result)
    }

    /// Convenience form of [`update_preference`](Self::update_preference).
    pub async fn upsert(
        &self,
        user: UserId,
        entity: EntityId,
        options: impl Into<String>,
    ) -> Result<Preference, PreferenceError> {
        self.update_preference(PreferenceInput::new(user, entity, options))
            .await
    }

    /// Find the preference for a (user, entity) pair. A miss is `Ok(None)`.
    pub async fn find_by_user_and_entity(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<Option<Preference>, PreferenceError> {
        self.require_not_disposed()?;
        require_user(user)?;
        require_entity(entity)?;

        tracing::debug!(
            parent: &self.span,
            user = %user,
            entity = %entity,
            "Querying preference by user and entity"
        );

        let result = self.store.find_by_user_and_entity(user, entity).await?;

        match &result {
            Some(preference) => {
                tracing::debug!(
                    parent: &self.span,
                    preference_id = preference.id,
                    "Found preference: {}",
                    preference
                );
            }
            None => {
                tracing::debug!(
                    parent: &self.span,
                    user = %user,
                    entity = %entity,
                    "No preference found"
                );
            }
        }

        Ok(result)
    }

    /// All preferences owned by a user, ordered by id.
    pub async fn find_by_user(&self, user: UserId) -> Result<Vec<Preference>, PreferenceError> {
        self.require_not_disposed()?;
        require_user(user)?;

        let result = self.store.find_by_user(user).await?;

        tracing::debug!(
            parent: &self.span,
            user = %user,
            count = result.len(),
            "Listed preferences"
        );

        Ok(result)
    }

    /// Delete the preference for a (user, entity) pair. Returns whether it existed.
    pub async fn delete_preference(
        &self,
        user: UserId,
        entity: EntityId,
    ) -> Result<bool, PreferenceError> {
        self.require_not_disposed()?;
        require_user(user)?;
        require_entity(entity)?;

        let deleted = self.store.delete_by_user_and_entity(user, entity).await?;

        tracing::debug!(
            parent: &self.span,
            user = %user,
            entity = %entity,
            deleted,
            "Deleted preference"
        );

        Ok(deleted)
    }

    /// Delete every preference attached to an entity, e.g. when a dashboard is removed.
    pub async fn delete_by_entity(&self, entity: EntityId) -> Result<u64, PreferenceError> {
        self.require_not_disposed()?;
        require_entity(entity)?;

        let deleted = self.store.delete_by_entity(entity).await?;

        tracing::debug!(
            parent: &self.span,
            entity = %entity,
            deleted,
            "Deleted preferences for entity"
        );

        Ok(deleted)
    }
}

impl std::fmt::Debug for PreferenceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceService")
            .field("state", &self.state())
            .field("max_options_length", &self.max_options_length)
            .finish_non_exhaustive()
    }
}
