//! Error types for memory operations.

/// Errors returned by vector stores and the memory service.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Vector backend unreachable or rejected a write.
    #[error("storage error: {0}")]
    Storage(String),
    /// Embedding the content failed.
    #[error("embedding error: {0}")]
    Embedding(String),
}
