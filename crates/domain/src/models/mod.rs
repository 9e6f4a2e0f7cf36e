//! Domain models for the preference store.

pub mod preference;

pub use preference::{EntityId, Preference, PreferenceInput, UserId};
