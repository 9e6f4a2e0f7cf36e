//! Runtime wiring for the preference store.
//!
//! Loads configuration, initializes logging, and assembles the
//! [`PreferenceService`](domain::services::PreferenceService) over PostgreSQL.

pub mod config;
pub mod error;
pub mod factory;
pub mod logging;

pub use config::Config;
pub use error::RuntimeError;
pub use factory::ServiceFactory;
