//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod preference;

pub use preference::PreferenceEntity;
