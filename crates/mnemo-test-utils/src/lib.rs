//! Shared test doubles for mnemo crates.

mod embedding;
mod llm;

pub use embedding::StaticEmbedding;
pub use llm::{FailingChat, ScriptedChat};
