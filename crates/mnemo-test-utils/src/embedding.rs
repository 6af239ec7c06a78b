use async_trait::async_trait;
use mnemo_llm::{EmbeddingProvider, LlmError};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Embedding provider with fixed per-text vectors and a fallback.
///
/// Lets tests script exact similarity scores: map two texts onto vectors
/// with a known cosine and the store reports that score.
pub struct StaticEmbedding {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    fallback: Vec<f32>,
}

impl StaticEmbedding {
    /// Create a provider with the given fallback vector.
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            vectors: Mutex::new(HashMap::new()),
            fallback,
        }
    }

    /// Map a text onto a fixed vector.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.lock().insert(text.into(), vector);
        self
    }

    /// Map a text onto a fixed vector on an existing provider.
    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.vectors.lock().insert(text.into(), vector);
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedding {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        let vectors = self.vectors.lock();
        Ok(input
            .into_iter()
            .map(|text| vectors.get(&text).cloned().unwrap_or_else(|| self.fallback.clone()))
            .collect())
    }
}
