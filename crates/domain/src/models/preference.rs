//! Preference domain model.
//!
//! A preference is an opaque options payload stored per (user, entity) pair,
//! for example the layout a user picked for a dashboard.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::PreferenceError;

/// Reference to the principal that owns a preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Reference to the subject entity a preference applies to (e.g. a dashboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns false for the unset reference (any non-positive id).
    pub fn is_set(&self) -> bool {
        shared::validation::validate_reference_id(self.0).is_ok()
    }
}

impl EntityId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns false for the unset reference (any non-positive id).
    pub fn is_set(&self) -> bool {
        shared::validation::validate_reference_id(self.0).is_ok()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A persisted preference row.
///
/// Equality and hashing only look at `(user, entity)`: two values with the
/// same owner and subject are the same logical preference whatever their
/// options or surrogate id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub id: i64,
    pub user: UserId,
    pub entity: Option<EntityId>,
    pub options: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detached representation of a preference, as handed to an upsert.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_entity_reference"))]
pub struct PreferenceInput {
    #[validate(custom(function = "validate_user_reference"))]
    pub user: UserId,

    #[validate(required(message = "Entity of the preference cannot be null"))]
    pub entity: Option<EntityId>,

    #[validate(custom(function = "validate_options_payload"))]
    pub options: String,
}

impl PreferenceInput {
    pub fn new(user: UserId, entity: EntityId, options: impl Into<String>) -> Self {
        Self {
            user,
            entity: Some(entity),
            options: options.into(),
        }
    }

    /// Validates the input, mapping failures to `InvalidArgument`.
    pub fn require_valid(&self) -> Result<(), PreferenceError> {
        self.validate().map_err(PreferenceError::from)
    }
}

impl Preference {
    /// Detaches this row so its options can be changed and written back.
    pub fn to_input(&self) -> PreferenceInput {
        PreferenceInput {
            user: self.user,
            entity: self.entity,
            options: self.options.clone(),
        }
    }
}

impl From<Preference> for PreferenceInput {
    fn from(preference: Preference) -> Self {
        Self {
            user: preference.user,
            entity: preference.entity,
            options: preference.options,
        }
    }
}

impl PartialEq for Preference {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user && self.entity == other.entity
    }
}

impl Eq for Preference {}

impl Hash for Preference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user.hash(state);
        self.entity.hash(state);
    }
}

impl PartialEq for PreferenceInput {
    fn eq(&self, other: &Self) -> bool {
        self.user == other.user && self.entity == other.entity
    }
}

impl Eq for PreferenceInput {}

impl Hash for PreferenceInput {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user.hash(state);
        self.entity.hash(state);
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Preference{{user={}, entity={}, options={}}}",
            self.user,
            display_entity(self.entity),
            self.options
        )
    }
}

impl fmt::Display for PreferenceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Preference{{user={}, entity={}, options={}}}",
            self.user,
            display_entity(self.entity),
            self.options
        )
    }
}

fn display_entity(entity: Option<EntityId>) -> String {
    entity.map_or_else(|| "null".to_string(), |e| e.to_string())
}

fn validate_user_reference(user: &UserId) -> Result<(), ValidationError> {
    if user.is_set() {
        Ok(())
    } else {
        let mut err = ValidationError::new("user_unset");
        err.message = Some("User of the preference cannot be null".into());
        Err(err)
    }
}

fn validate_options_payload(options: &str) -> Result<(), ValidationError> {
    shared::validation::validate_no_nul_bytes(options).map_err(|mut err| {
        err.message = Some("Options of the preference cannot contain NUL characters".into());
        err
    })
}

fn validate_entity_reference(input: &PreferenceInput) -> Result<(), ValidationError> {
    match input.entity {
        Some(entity) if !entity.is_set() => {
            let mut err = ValidationError::new("entity_unset");
            err.message = Some("Entity of the preference cannot be null".into());
            Err(err)
        }
        _ => Ok(()),
    }
}
