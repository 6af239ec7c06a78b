//! Chat-completion provider abstraction.

use crate::error::LlmError;
use async_trait::async_trait;

/// Speaker role understood by chat-completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// System instruction.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
}

impl ChatRole {
    /// Return the wire-format role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Role-tagged message sent to a chat-completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role that produced the message.
    pub role: ChatRole,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[async_trait]
/// Chat-completion backend used by the orchestrator.
///
/// Calls are synchronous from the caller's perspective and bounded only by
/// the backend's own timeout; the core never retries.
pub trait ChatProvider: Send + Sync {
    /// Produce a completion for the given role-tagged prompt.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}
