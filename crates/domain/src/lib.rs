//! Domain layer for the preference store.
//!
//! This crate contains:
//! - Domain models (Preference and the references it is keyed by)
//! - The storage contract and the preference service
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::PreferenceError;
