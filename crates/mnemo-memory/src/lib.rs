//! Long-term memory storage and retrieval for mnemo.
//!
//! A `MemoryService` enforces deduplication and relevance policy on top of
//! a pluggable `VectorMemoryStore`; the in-process store implementation
//! embeds content through any `EmbeddingProvider` and ranks by cosine
//! similarity.

pub mod error;
pub mod filter;
pub mod model;
pub mod service;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// Metadata filter expressions.
pub use filter::FieldFilter;
/// Memory record model.
pub use model::{Memory, MemoryKind, StoredMemory, SYSTEM_USER_ID};
/// Policy layer over the vector store.
pub use service::MemoryService;
/// Vector store interface and default in-process implementation.
pub use store::{InMemoryVectorStore, ScoredDocument, VectorDocument, VectorMemoryStore};
