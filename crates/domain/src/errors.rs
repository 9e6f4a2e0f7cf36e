//! Domain error types.

use thiserror::Error;

/// Errors raised by the preference store and service.
///
/// A lookup that matches nothing is not an error: it returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl PreferenceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<validator::ValidationErrors> for PreferenceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();

        let message = if messages.len() == 1 {
            messages.remove(0)
        } else {
            format!("{} validation errors", messages.len())
        };

        PreferenceError::InvalidArgument(message)
    }
}
