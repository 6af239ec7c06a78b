//! Error types for the orchestration crate.

use thiserror::Error;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Completion model failure on the primary response path.
    #[error("model error: {0}")]
    Model(String),
    /// Conversation store failure.
    #[error("store error: {0}")]
    Store(String),
    /// Memory service failure.
    #[error("memory error: {0}")]
    Memory(String),
}
