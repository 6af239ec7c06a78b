//! Vector store interface and the in-process cosine-similarity backend.

use crate::error::MemoryError;
use crate::filter::FieldFilter;
use async_trait::async_trait;
use log::debug;
use mnemo_llm::EmbeddingProvider;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Document stored in a vector backend: primary text plus sidecar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    /// Record identifier assigned by the backend.
    pub id: Uuid,
    /// Primary text, the embedded content.
    pub content: String,
    /// Sidecar metadata fields used for filtering.
    pub fields: BTreeMap<String, String>,
}

/// Search hit with its similarity score, higher is more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    /// The matched document.
    pub document: VectorDocument,
    /// Similarity score reported by the backend.
    pub score: f32,
}

#[async_trait]
/// Vector-similarity backend used by the memory service.
///
/// Score thresholds are the caller's business: the store ranks and
/// returns, it never filters by score.
pub trait VectorMemoryStore: Send + Sync {
    /// Insert one document; atomic at this boundary, never partially applied.
    async fn store(
        &self,
        content: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<Uuid, MemoryError>;

    /// Return up to `top_k` matches ordered by descending similarity.
    ///
    /// An empty index or no qualifying match yields an empty list, not an
    /// error.
    async fn search(
        &self,
        query: &str,
        filter: Option<&FieldFilter>,
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>, MemoryError>;
}

struct Entry {
    document: VectorDocument,
    embedding: Vec<f32>,
}

/// In-process vector store ranking by cosine similarity.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryVectorStore {
    /// Create an empty store over the given embedding provider.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl VectorMemoryStore for InMemoryVectorStore {
    async fn store(
        &self,
        content: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<Uuid, MemoryError> {
        let embedding = self
            .embedder
            .embed_one(content)
            .await
            .map_err(|err| MemoryError::Embedding(err.to_string()))?;
        let document = VectorDocument {
            id: Uuid::new_v4(),
            content: content.to_string(),
            fields,
        };
        let id = document.id;
        self.entries.write().push(Entry {
            document,
            embedding,
        });
        debug!("stored vector document (id={id}, content_len={})", content.len());
        Ok(id)
    }

    async fn search(
        &self,
        query: &str,
        filter: Option<&FieldFilter>,
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>, MemoryError> {
        if top_k == 0 || self.entries.read().is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = self
            .embedder
            .embed_one(query)
            .await
            .map_err(|err| MemoryError::Embedding(err.to_string()))?;

        let entries = self.entries.read();
        let mut scored = entries
            .iter()
            .filter(|entry| {
                filter.is_none_or(|filter| filter.matches(&entry.document.fields))
            })
            .map(|entry| ScoredDocument {
                document: entry.document.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        debug!(
            "vector search (query_len={}, matched={})",
            query.len(),
            scored.len()
        );
        Ok(scored)
    }
}

/// Cosine similarity between two vectors; zero when either has no norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
