//! Shared utilities and common types for the preference store.
//!
//! This crate provides common functionality used across all other crates:
//! - Common validation logic

pub mod validation;
