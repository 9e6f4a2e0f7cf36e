//! Repository implementations for database operations.

pub mod preference;

pub use preference::PreferenceRepository;
