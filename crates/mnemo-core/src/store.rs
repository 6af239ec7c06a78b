//! Durable conversation persistence with TTL expiry.
//!
//! Saves always replace the full persisted sequence (delete-then-rewrite)
//! so a shorter history never leaves stale tail entries behind, and every
//! save resets the expiry clock.

use crate::codec::{decode_message, encode_message};
use crate::types::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by conversation stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
/// Key/value persistence for per-user conversation histories.
pub trait ConversationStore: Send + Sync {
    /// Atomically replace the persisted sequence and reset its expiry.
    async fn save(&self, user_id: &str, messages: &[Message]) -> Result<(), StoreError>;

    /// Load the persisted sequence; empty when absent or expired.
    async fn load(&self, user_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Delete the persisted sequence immediately, bypassing the TTL.
    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}

struct StoredConversation {
    lines: Vec<String>,
    expires_at: DateTime<Utc>,
}

/// In-process conversation store, useful for tests and single-node demos.
///
/// Holds the encoded record lines rather than decoded messages so the
/// codec is exercised on both paths.
pub struct MemoryConversationStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, StoredConversation>>,
}

impl MemoryConversationStore {
    /// Create a store whose entries expire after `ttl` of inactivity.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn expiry_from_now(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn save(&self, user_id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let lines = messages.iter().map(encode_message).collect::<Vec<_>>();
        debug!(
            "saving conversation (user_id={user_id}, messages={})",
            lines.len()
        );
        self.entries.lock().insert(
            user_id.to_string(),
            StoredConversation {
                lines,
                expires_at: self.expiry_from_now(),
            },
        );
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Message>, StoreError> {
        let mut entries = self.entries.lock();
        let Some(stored) = entries.get(user_id) else {
            return Ok(Vec::new());
        };
        if stored.expires_at <= Utc::now() {
            debug!("conversation expired (user_id={user_id})");
            entries.remove(user_id);
            return Ok(Vec::new());
        }
        Ok(stored
            .lines
            .iter()
            .filter_map(|line| decode_message(line))
            .collect())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(user_id);
        info!("cleared conversation (user_id={user_id})");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConversationHeader {
    expires_at: DateTime<Utc>,
}

/// File-backed conversation store: one record file per user under a root
/// directory, first line carrying the expiry header.
pub struct FileConversationStore {
    root: PathBuf,
    ttl: Duration,
}

impl FileConversationStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl AsRef<Path>, ttl: Duration) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!(
            "initialized file conversation store (root={})",
            root.display()
        );
        Ok(Self { root, ttl })
    }

    /// Path to the conversation file for a user id.
    fn conversation_path(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("{}.jsonl", sanitize_user_id(user_id)))
    }

    /// Path to the temporary rewrite file.
    fn temp_path(&self, user_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.jsonl.tmp", sanitize_user_id(user_id)))
    }
}

/// Reduce a user id to a filesystem-safe file stem.
fn sanitize_user_id(user_id: &str) -> String {
    user_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn save(&self, user_id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let path = self.conversation_path(user_id);
        let temp_path = self.temp_path(user_id);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let header = ConversationHeader {
                expires_at: Utc::now()
                    + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero()),
            };
            writeln!(file, "{}", serde_json::to_string(&header)?)?;
            for message in messages {
                writeln!(file, "{}", encode_message(message))?;
            }
        }
        if path.exists() {
            fs::remove_file(&path)?;
        }
        fs::rename(temp_path, path)?;
        debug!(
            "saved conversation (user_id={user_id}, messages={})",
            messages.len()
        );
        Ok(())
    }

    async fn load(&self, user_id: &str) -> Result<Vec<Message>, StoreError> {
        let path = self.conversation_path(user_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let mut lines = BufReader::new(file).lines();

        let Some(header_line) = lines.next().transpose()? else {
            warn!("conversation file missing header (user_id={user_id})");
            return Ok(Vec::new());
        };
        let header: ConversationHeader = match serde_json::from_str(&header_line) {
            Ok(header) => header,
            Err(err) => {
                warn!("unreadable conversation header (user_id={user_id}): {err}");
                return Ok(Vec::new());
            }
        };
        if header.expires_at <= Utc::now() {
            debug!("conversation expired (user_id={user_id})");
            drop(lines);
            fs::remove_file(&path)?;
            return Ok(Vec::new());
        }

        let mut messages = Vec::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(message) = decode_message(&line) {
                messages.push(message);
            }
        }
        Ok(messages)
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        let path = self.conversation_path(user_id);
        if path.exists() {
            fs::remove_file(path)?;
            info!("cleared conversation (user_id={user_id})");
        }
        Ok(())
    }
}
