//! Memory record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner sentinel for memories shared across all users.
pub const SYSTEM_USER_ID: &str = "system";

/// Category of a long-term memory.
///
/// Episodic memories are user-specific preferences and experiences
/// ("prefers window seats", "visited Paris last year"); semantic memories
/// are general domain facts shared across users ("Singapore requires a
/// passport").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryKind {
    /// User-specific experience or preference.
    Episodic,
    /// General domain fact, shared across users.
    Semantic,
}

impl MemoryKind {
    /// Return the stored tag name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Episodic => "EPISODIC",
            MemoryKind::Semantic => "SEMANTIC",
        }
    }

    /// Parse a stored tag name, `None` for anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "EPISODIC" => Some(MemoryKind::Episodic),
            "SEMANTIC" => Some(MemoryKind::Semantic),
            _ => None,
        }
    }
}

/// A single fact held in long-term memory.
///
/// Records are append-only: nothing updates or deletes a memory, and the
/// identity used for deduplication is semantic similarity within the same
/// (kind, owner) scope rather than the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    /// Record identifier, generated at creation.
    pub id: Uuid,
    /// Free-text content.
    pub content: String,
    /// Memory category.
    #[serde(rename = "memoryType")]
    pub kind: MemoryKind,
    /// Opaque JSON-object-shaped string.
    pub metadata: String,
    /// Owning user, or the `"system"` sentinel for shared facts.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Creation timestamp, never mutated.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Memory {
    /// Build a fresh record with a new id and the current timestamp.
    pub fn new(
        content: impl Into<String>,
        kind: MemoryKind,
        user_id: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            kind,
            metadata: metadata.into(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A memory plus the embedding the backend holds for it.
///
/// The backend owns and recomputes embeddings, so read paths leave the
/// vector as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMemory {
    /// The memory record.
    pub memory: Memory,
    /// Embedding vector, when the caller has one in hand.
    pub embedding: Option<Vec<f32>>,
}

impl StoredMemory {
    /// Wrap a memory without an embedding.
    pub fn new(memory: Memory) -> Self {
        Self {
            memory,
            embedding: None,
        }
    }
}
