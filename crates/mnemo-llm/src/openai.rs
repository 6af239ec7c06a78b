//! OpenAI-compatible HTTP provider for chat completions and embeddings.
//!
//! Talks to any backend exposing the `/v1/chat/completions` and
//! `/v1/embeddings` shapes (OpenAI, Ollama, vLLM and friends). No
//! streaming and no retries; transient failures surface to the caller.

use crate::chat::{ChatMessage, ChatProvider};
use crate::embedding::EmbeddingProvider;
use crate::error::LlmError;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL pointing at the public OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI-compatible chat and embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiProvider {
    /// Create a provider for the given models against the default base URL.
    pub fn new(
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
        })
    }

    /// Override the base URL, trailing slash stripped for path joining.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the bearer token; blank keys are treated as absent.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key)
        };
        self
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(format!("{}{path}", self.base_url));
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }
        builder
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.chat_model,
            messages: messages
                .iter()
                .map(|message| WireMessage {
                    role: message.role.as_str(),
                    content: &message.content,
                })
                .collect(),
        };
        debug!(
            "chat completion request (model={}, messages={})",
            self.chat_model,
            messages.len()
        );
        let response = self
            .request("/chat/completions")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!(
                "chat completion failed with status {status}: {detail}"
            )));
        }
        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: &input,
        };
        debug!(
            "embedding request (model={}, inputs={})",
            self.embedding_model,
            input.len()
        );
        let response = self.request("/embeddings").json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!(
                "embedding failed with status {status}: {detail}"
            )));
        }
        let decoded: EmbeddingResponse = response.json().await?;
        if decoded.data.len() != input.len() {
            return Err(LlmError::Provider(format!(
                "embedding count mismatch: requested {}, got {}",
                input.len(),
                decoded.data.len()
            )));
        }
        Ok(decoded.data.into_iter().map(|datum| datum.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::OpenAiProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let provider = OpenAiProvider::new("gpt", "embed")
            .expect("provider")
            .with_base_url("http://localhost:11434/v1/");
        assert_eq!(provider.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn blank_api_key_is_absent() {
        let provider = OpenAiProvider::new("gpt", "embed")
            .expect("provider")
            .with_api_key("  ");
        assert_eq!(provider.api_key, None);
    }
}
