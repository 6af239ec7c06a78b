//! Policy layer for memory lifecycle: validation, dedup, retrieval.

use crate::error::MemoryError;
use crate::filter::FieldFilter;
use crate::model::{Memory, MemoryKind, StoredMemory, SYSTEM_USER_ID};
use crate::store::VectorMemoryStore;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Sidecar field holding the memory kind tag.
const FIELD_MEMORY_TYPE: &str = "memoryType";
/// Sidecar field holding the opaque metadata string.
const FIELD_METADATA: &str = "metadata";
/// Sidecar field holding the owning user id.
const FIELD_USER_ID: &str = "userId";
/// Sidecar field holding the creation timestamp.
const FIELD_CREATED_AT: &str = "createdAt";

/// Memory lifecycle service: the only consumer-visible abstraction for
/// storing and retrieving long-term memories.
///
/// Records are append-only. A write is skipped when a semantically
/// near-duplicate already exists in the same (kind, owner) scope, giving
/// an at-most-once-per-fact guarantee rather than an error.
pub struct MemoryService {
    store: Arc<dyn VectorMemoryStore>,
    dedup_threshold: f32,
}

impl MemoryService {
    /// Create a service over a vector store with the given dedup threshold.
    pub fn new(store: Arc<dyn VectorMemoryStore>, dedup_threshold: f32) -> Self {
        Self {
            store,
            dedup_threshold,
        }
    }

    /// Store a memory unless a near-duplicate already exists.
    ///
    /// Metadata that does not parse as a JSON object shape is silently
    /// replaced by `"{}"`. A detected duplicate returns an unpersisted
    /// echo of the record; an adapter write failure propagates.
    pub async fn store_memory(
        &self,
        content: &str,
        kind: MemoryKind,
        user_id: Option<&str>,
        metadata: Option<&str>,
    ) -> Result<StoredMemory, MemoryError> {
        info!("preparing to store memory: {content}");
        let metadata = normalize_metadata(metadata.unwrap_or("{}"));
        let owner = user_id.unwrap_or(SYSTEM_USER_ID);
        let memory = Memory::new(content, kind, owner, metadata.clone());

        if self.similar_memory_exists(content, kind, user_id).await? {
            info!("similar memory found, skipping storage");
            return Ok(StoredMemory::new(memory));
        }

        let fields = BTreeMap::from([
            (FIELD_MEMORY_TYPE.to_string(), kind.as_str().to_string()),
            (FIELD_METADATA.to_string(), metadata),
            (FIELD_USER_ID.to_string(), owner.to_string()),
            (
                FIELD_CREATED_AT.to_string(),
                memory.created_at.to_rfc3339(),
            ),
        ]);
        match self.store.store(content, fields).await {
            Ok(_) => info!("stored {} memory: {content}", kind.as_str()),
            Err(err) => {
                error!("error storing memory: {err}");
                return Err(err);
            }
        }
        Ok(StoredMemory::new(memory))
    }

    /// Retrieve memories relevant to a query.
    ///
    /// The caller always also sees system-scoped shared facts. Only results
    /// scoring strictly above `distance_threshold` are kept — despite the
    /// name this is a similarity floor, preserved as-is from the reference
    /// behavior. Nothing qualifying yields an empty list, never an error.
    pub async fn retrieve_memories(
        &self,
        query: &str,
        kind: Option<MemoryKind>,
        user_id: Option<&str>,
        limit: usize,
        distance_threshold: f32,
    ) -> Result<Vec<StoredMemory>, MemoryError> {
        debug!("retrieving memories for query: {query}");
        let effective_user_id = user_id.unwrap_or(SYSTEM_USER_ID);
        let mut filters = vec![FieldFilter::any([
            FieldFilter::eq(FIELD_USER_ID, effective_user_id),
            FieldFilter::eq(FIELD_USER_ID, SYSTEM_USER_ID),
        ])];
        if let Some(kind) = kind {
            filters.push(FieldFilter::eq(FIELD_MEMORY_TYPE, kind.as_str()));
        }
        let filter = FieldFilter::all(filters);

        let start = Instant::now();
        let results = self.store.search(query, Some(&filter), limit).await?;

        let memories = results
            .into_iter()
            .filter(|result| distance_threshold < result.score)
            .map(|result| StoredMemory::new(memory_from_document(result.document)))
            .collect::<Vec<_>>();

        info!(
            "retrieved {} memories in {} ms",
            memories.len(),
            start.elapsed().as_millis()
        );
        Ok(memories)
    }

    /// Whether a near-duplicate of `content` exists in the same scope.
    pub async fn similar_memory_exists(
        &self,
        content: &str,
        kind: MemoryKind,
        user_id: Option<&str>,
    ) -> Result<bool, MemoryError> {
        let effective_user_id = user_id.unwrap_or(SYSTEM_USER_ID);
        let filter = FieldFilter::all([
            FieldFilter::eq(FIELD_USER_ID, effective_user_id),
            FieldFilter::eq(FIELD_MEMORY_TYPE, kind.as_str()),
        ]);
        let results = self.store.search(content, Some(&filter), 1).await?;
        Ok(results
            .first()
            .is_some_and(|top| self.dedup_threshold < top.score))
    }
}

/// Accept metadata only if it parses as a JSON object shape.
///
/// Anything else is replaced by `"{}"` without failing the call; JSON5 is
/// used so config-style leniency (unquoted keys, trailing commas) carries
/// over.
fn normalize_metadata(metadata: &str) -> String {
    match json5::from_str::<serde_json::Value>(metadata) {
        Ok(value) if value.is_object() => metadata.to_string(),
        _ => {
            warn!("invalid metadata format, using empty JSON object instead: {metadata}");
            "{}".to_string()
        }
    }
}

/// Map a stored document back into a memory record.
///
/// Field parsing never discards a record: a bad timestamp falls back to
/// the current time and an unknown kind tag to semantic.
fn memory_from_document(document: crate::store::VectorDocument) -> Memory {
    let kind = document
        .fields
        .get(FIELD_MEMORY_TYPE)
        .and_then(|tag| MemoryKind::parse(tag))
        .unwrap_or(MemoryKind::Semantic);
    let created_at = document
        .fields
        .get(FIELD_CREATED_AT)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    Memory {
        id: document.id,
        content: document.content,
        kind,
        metadata: document
            .fields
            .get(FIELD_METADATA)
            .cloned()
            .unwrap_or_else(|| "{}".to_string()),
        user_id: document
            .fields
            .get(FIELD_USER_ID)
            .cloned()
            .unwrap_or_else(|| SYSTEM_USER_ID.to_string()),
        created_at,
    }
}
