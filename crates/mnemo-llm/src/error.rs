//! Error types for model providers.

/// Errors returned by chat and embedding providers.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Backend rejected or failed the request.
    #[error("provider error: {0}")]
    Provider(String),
    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Response decoding failure.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Backend returned no usable completion or embedding.
    #[error("empty response from provider")]
    EmptyResponse,
}
