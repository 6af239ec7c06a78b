//! Per-user conversation history cache.
//!
//! An explicit, injected store rather than ambient global state: construct
//! one at startup, share it by `Arc`, drop it to clear. Each user's entry
//! carries its own async mutex so a turn can hold the lock across the full
//! load-mutate-persist sequence, keeping concurrent requests for the same
//! user serialized instead of racing.

use crate::types::Message;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared history entry for one user.
pub type HistoryHandle = Arc<Mutex<Vec<Message>>>;

/// Concurrent map of user id to locked conversation history.
///
/// Once populated, the cached copy is authoritative; the durable store is
/// the fallback consulted only on a miss.
#[derive(Default)]
pub struct ConversationCache {
    entries: RwLock<HashMap<String, HistoryHandle>>,
}

impl ConversationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for a user, creating an empty one if absent.
    pub fn entry(&self, user_id: &str) -> HistoryHandle {
        if let Some(handle) = self.entries.read().get(user_id) {
            return handle.clone();
        }
        self.entries
            .write()
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    /// Return the entry for a user without creating one.
    pub fn get(&self, user_id: &str) -> Option<HistoryHandle> {
        self.entries.read().get(user_id).cloned()
    }

    /// Drop a user's entry.
    pub fn remove(&self, user_id: &str) {
        self.entries.write().remove(user_id);
    }

    /// Number of cached conversations.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no conversations.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ConversationCache;
    use crate::types::Message;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn entry_is_stable_per_user() {
        let cache = ConversationCache::new();
        let first = cache.entry("alice");
        first.lock().await.push(Message::user("hi"));

        let second = cache.entry("alice");
        assert_eq!(second.lock().await.len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let cache = ConversationCache::new();
        assert!(cache.get("alice").is_none());
        cache.entry("alice");
        assert!(cache.get("alice").is_some());
    }

    #[tokio::test]
    async fn remove_forgets_the_user() {
        let cache = ConversationCache::new();
        cache.entry("alice");
        cache.remove("alice");
        assert!(cache.get("alice").is_none());
        assert!(cache.is_empty());
        // Removing again is harmless.
        cache.remove("alice");
    }
}
