//! Configuration schema for mnemo.

use serde::{Deserialize, Serialize};

/// Root config for the mnemo service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MnemoConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl MnemoConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MnemoConfigBuilder {
        MnemoConfigBuilder::new()
    }
}

/// Builder for assembling a `MnemoConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MnemoConfigBuilder {
    config: MnemoConfig,
}

impl MnemoConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: MnemoConfig::default(),
        }
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the conversation configuration.
    pub fn conversation(mut self, conversation: ConversationConfig) -> Self {
        self.config.conversation = conversation;
        self
    }

    /// Replace the model provider configuration.
    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Replace the server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Finalize and return the built `MnemoConfig`.
    pub fn build(self) -> MnemoConfig {
        self.config
    }
}

/// Memory thresholds and retrieval limits.
///
/// The two thresholds are deliberately far apart: dedup wants precision
/// (only near-duplicates are skipped), relevance wants recall (loosely
/// related memories still enrich the prompt). Both assume the backend's
/// similarity scores, so they are configuration rather than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Similarity above which a candidate memory counts as a duplicate.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,
    /// Similarity above which a stored memory is injected into the prompt.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,
    /// Maximum memories retrieved per turn.
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: default_dedup_threshold(),
            relevance_threshold: default_relevance_threshold(),
            recall_limit: default_recall_limit(),
        }
    }
}

/// Default dedup similarity threshold.
fn default_dedup_threshold() -> f32 {
    0.9
}

/// Default relevance similarity threshold.
fn default_relevance_threshold() -> f32 {
    0.3
}

/// Default number of memories to recall per query.
fn default_recall_limit() -> usize {
    5
}

/// Conversation history persistence and summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Seconds of inactivity before the persisted copy expires.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// History length beyond which the next turn summarizes.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Messages kept verbatim at the tail when summarizing.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Override for the assistant system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Directory for the file-backed store; in-memory when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_messages: default_max_messages(),
            keep_recent: default_keep_recent(),
            system_prompt: None,
            path: None,
        }
    }
}

/// Default persisted-history TTL in seconds.
fn default_ttl_secs() -> u64 {
    3600
}

/// Default summarization trigger length.
fn default_max_messages() -> usize {
    10
}

/// Default number of recent messages preserved by summarization.
fn default_keep_recent() -> usize {
    4
}

/// Model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat-completion model name.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Default provider base URL.
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Default chat model name.
fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Default embedding model name.
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Default API key environment variable.
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Default listen address.
fn default_listen() -> String {
    "127.0.0.1:8799".to_string()
}

#[cfg(test)]
mod tests {
    use super::MnemoConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = MnemoConfig::default();
        assert_eq!(config.memory.dedup_threshold, 0.9);
        assert_eq!(config.memory.relevance_threshold, 0.3);
        assert_eq!(config.memory.recall_limit, 5);
        assert_eq!(config.conversation.ttl_secs, 3600);
        assert_eq!(config.conversation.max_messages, 10);
        assert_eq!(config.conversation.keep_recent, 4);
    }

    #[test]
    fn builder_replaces_sections() {
        let memory = super::MemoryConfig {
            dedup_threshold: 0.8,
            ..super::MemoryConfig::default()
        };
        let config = MnemoConfig::builder().memory(memory).build();
        assert_eq!(config.memory.dedup_threshold, 0.8);
        assert_eq!(config.memory.relevance_threshold, 0.3);
    }
}
