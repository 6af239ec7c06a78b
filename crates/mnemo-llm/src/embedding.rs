//! Embedding provider abstraction.

use crate::error::LlmError;
use async_trait::async_trait;

#[async_trait]
/// Embedding backend used by vector stores.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts into fixed-length vectors, one per input.
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Embed a single text.
    async fn embed_one(&self, input: &str) -> Result<Vec<f32>, LlmError> {
        let mut vectors = self.embed(vec![input.to_string()]).await?;
        if vectors.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(vectors.swap_remove(0))
    }
}
