//! Conversation orchestration for mnemo.
//!
//! Owns the per-user conversation state machine: history load/seed,
//! memory-context injection, completion calls, best-effort memory
//! extraction, summarization, and durable persistence.

mod cache;
mod chat;
mod codec;
mod error;
mod extract;
pub mod prompt;
mod store;
mod types;

/// Explicit per-user history cache.
pub use cache::ConversationCache;
/// Orchestrator, policy, and turn result types.
pub use chat::{ChatOrchestrator, ChatPolicy, ChatTurn, TurnTimings};
/// Persisted-record escape helpers, exposed for their round-trip law.
pub use codec::{escape, unescape};
/// Core error type.
pub use error::CoreError;
/// Extraction candidate parsing.
pub use extract::{MemoryCandidate, parse_candidates};
/// Conversation persistence interface and implementations.
pub use store::{ConversationStore, FileConversationStore, MemoryConversationStore, StoreError};
/// Message and role types.
pub use types::{Message, Role};
