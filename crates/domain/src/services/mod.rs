//! Domain services for the preference store.
//!
//! Services contain business logic that operates on domain models.

pub mod preference;
pub mod preference_store;

pub use preference::{PreferenceService, ServiceState};
pub use preference_store::{InMemoryPreferenceStore, PreferenceStore};
