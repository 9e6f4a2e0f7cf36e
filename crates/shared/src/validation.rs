//! Common validation utilities.

use validator::ValidationError;

/// Default upper bound for an options payload in bytes (1 MiB).
pub const DEFAULT_MAX_OPTIONS_LENGTH: usize = 1_048_576;

/// Validates that a reference id points at a stored row.
///
/// Ids are assigned by the database starting at 1, so zero and negative
/// values mean the reference was never set.
pub fn validate_reference_id(id: i64) -> Result<(), ValidationError> {
    if id > 0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("reference_unset");
        err.message = Some("Reference id must be a positive integer".into());
        Err(err)
    }
}

/// Validates that a serialized payload does not exceed `max_len` bytes.
pub fn validate_payload_length(payload: &str, max_len: usize) -> Result<(), ValidationError> {
    if payload.len() <= max_len {
        Ok(())
    } else {
        let mut err = ValidationError::new("payload_too_large");
        err.message = Some(
            format!(
                "Payload is {} bytes, exceeds the maximum of {} bytes",
                payload.len(),
                max_len
            )
            .into(),
        );
        Err(err)
    }
}

/// Validates that a text payload contains no NUL bytes.
///
/// PostgreSQL `TEXT` columns cannot store `\0`.
pub fn validate_no_nul_bytes(payload: &str) -> Result<(), ValidationError> {
    match payload.find('\0') {
        None => Ok(()),
        Some(position) => {
            let mut err = ValidationError::new("payload_nul_byte");
            err.message = Some(
                format!("Payload contains a NUL byte at offset {}", position).into(),
            );
            Err(err)
        }
    }
}
