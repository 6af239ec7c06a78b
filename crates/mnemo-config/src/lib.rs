//! Configuration models and loading for mnemo.
//!
//! This crate owns the config schema, defaulting, validation, and the
//! JSON5 file loader used by the server binary and SDK consumers.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Configuration schema models.
pub use model::*;
