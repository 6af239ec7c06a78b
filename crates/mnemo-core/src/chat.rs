//! Per-user conversation turn orchestration.

use crate::cache::ConversationCache;
use crate::error::CoreError;
use crate::extract::parse_candidates;
use crate::prompt;
use crate::store::ConversationStore;
use crate::types::Message;
use log::{debug, error, info, warn};
use mnemo_config::MnemoConfig;
use mnemo_llm::{ChatMessage, ChatProvider};
use mnemo_memory::{Memory, MemoryKind, MemoryService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Tunables for the turn state machine.
#[derive(Debug, Clone)]
pub struct ChatPolicy {
    /// History length beyond which the turn ends with a summarization.
    pub max_messages: usize,
    /// Messages kept verbatim at the tail when summarizing.
    pub keep_recent: usize,
    /// System prompt seeded into fresh conversations.
    pub system_prompt: String,
    /// Similarity floor for injecting memories into the prompt.
    pub relevance_threshold: f32,
    /// Maximum memories retrieved per turn.
    pub recall_limit: usize,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_messages: 10,
            keep_recent: 4,
            system_prompt: prompt::DEFAULT_SYSTEM_PROMPT.to_string(),
            relevance_threshold: 0.3,
            recall_limit: 5,
        }
    }
}

impl ChatPolicy {
    /// Map config values onto a runtime policy.
    pub fn from_config(config: &MnemoConfig) -> Self {
        Self {
            max_messages: config.conversation.max_messages,
            keep_recent: config.conversation.keep_recent,
            system_prompt: config
                .conversation
                .system_prompt
                .clone()
                .unwrap_or_else(|| prompt::DEFAULT_SYSTEM_PROMPT.to_string()),
            relevance_threshold: config.memory.relevance_threshold,
            recall_limit: config.memory.recall_limit,
        }
    }
}

/// Wall-clock timings for the steps of one turn, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnTimings {
    /// Memory retrieval (embedding and search included).
    pub retrieval_ms: u64,
    /// Primary completion call.
    pub completion_ms: u64,
    /// Extraction completion call and parsing.
    pub extraction_ms: u64,
    /// Candidate memory storage.
    pub storage_ms: u64,
    /// Whole turn.
    pub total_ms: u64,
}

/// Result of one conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Assistant response text.
    pub response: String,
    /// Per-step timing breakdown.
    pub timings: TurnTimings,
}

/// Per-user conversation state machine.
///
/// A conversation starts on a user's first turn: cache, then durable
/// store, then a fresh system-prompt seed. Each turn augments the prompt
/// with relevant long-term memories, extracts new memories from the
/// exchange, and summarizes once the history outgrows the policy length.
/// Memory extraction, memory storage, persistence, and summarization are
/// all best-effort; only the primary completion failure fails the turn.
pub struct ChatOrchestrator {
    llm: Arc<dyn ChatProvider>,
    memory: Arc<MemoryService>,
    store: Arc<dyn ConversationStore>,
    cache: Arc<ConversationCache>,
    policy: ChatPolicy,
}

impl ChatOrchestrator {
    /// Construct an orchestrator from its collaborators.
    pub fn new(
        llm: Arc<dyn ChatProvider>,
        memory: Arc<MemoryService>,
        store: Arc<dyn ConversationStore>,
        cache: Arc<ConversationCache>,
        policy: ChatPolicy,
    ) -> Self {
        Self {
            llm,
            memory,
            store,
            cache,
            policy,
        }
    }

    /// Run one conversation turn for a user.
    pub async fn send_message(&self, message: &str, user_id: &str) -> Result<ChatTurn, CoreError> {
        let turn_start = Instant::now();
        info!("processing message from user {user_id}: {message}");

        // The per-user lock is held for the whole turn so concurrent
        // requests for the same user cannot interleave load and persist.
        let handle = self.cache.entry(user_id);
        let mut history = handle.lock().await;
        if history.is_empty() {
            *history = self.initial_history(user_id).await;
        }

        let start = Instant::now();
        let memories = self.relevant_memories(message, user_id).await;
        let retrieval_ms = elapsed_ms(start);

        if !memories.is_empty() {
            let context = prompt::memory_context(&memories);
            info!("added memory context to conversation: {context}");
            history.push(Message::system(context));
        }

        history.push(Message::user(message));

        let start = Instant::now();
        let request = history.iter().map(Message::to_chat).collect::<Vec<_>>();
        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|err| CoreError::Model(err.to_string()))?;
        let completion_ms = elapsed_ms(start);

        history.push(Message::assistant(response.clone()));

        if let Err(err) = self.store.save(user_id, &history).await {
            error!("error saving conversation history: {err}");
        }

        let start = Instant::now();
        let candidates = self.extract_memories(message, &response).await;
        let extraction_ms = elapsed_ms(start);

        let start = Instant::now();
        self.store_candidates(candidates, user_id).await;
        let storage_ms = elapsed_ms(start);

        if history.len() > self.policy.max_messages {
            self.summarize(&mut history, user_id).await;
            if let Err(err) = self.store.save(user_id, &history).await {
                error!("error saving summarized history: {err}");
            }
        }

        Ok(ChatTurn {
            response,
            timings: TurnTimings {
                retrieval_ms,
                completion_ms,
                extraction_ms,
                storage_ms,
                total_ms: elapsed_ms(turn_start),
            },
        })
    }

    /// Return the conversation history for a user.
    ///
    /// A cache hit returns immediately; a miss loads the durable copy and
    /// populates the cache without seeding a system prompt.
    pub async fn history(&self, user_id: &str) -> Vec<Message> {
        if let Some(handle) = self.cache.get(user_id) {
            return handle.lock().await.clone();
        }
        match self.store.load(user_id).await {
            Ok(messages) => {
                if !messages.is_empty() {
                    let handle = self.cache.entry(user_id);
                    *handle.lock().await = messages.clone();
                }
                messages
            }
            Err(err) => {
                error!("error loading conversation history: {err}");
                Vec::new()
            }
        }
    }

    /// Drop a user's conversation from cache and durable storage.
    ///
    /// Idempotent; the next turn starts from a fresh seed.
    pub async fn clear_history(&self, user_id: &str) -> Result<(), CoreError> {
        self.cache.remove(user_id);
        self.store
            .clear(user_id)
            .await
            .map_err(|err| CoreError::Store(err.to_string()))?;
        info!("cleared conversation history for user {user_id}");
        Ok(())
    }

    /// First-turn history: durable copy if present, fresh seed otherwise.
    async fn initial_history(&self, user_id: &str) -> Vec<Message> {
        match self.store.load(user_id).await {
            Ok(persisted) if !persisted.is_empty() => {
                debug!(
                    "restored conversation from store (user_id={user_id}, messages={})",
                    persisted.len()
                );
                persisted
            }
            Ok(_) => vec![Message::system(self.policy.system_prompt.clone())],
            Err(err) => {
                error!("error loading conversation history: {err}");
                vec![Message::system(self.policy.system_prompt.clone())]
            }
        }
    }

    /// Retrieve memories relevant to the incoming message, best-effort.
    async fn relevant_memories(&self, message: &str, user_id: &str) -> Vec<Memory> {
        match self
            .memory
            .retrieve_memories(
                message,
                None,
                Some(user_id),
                self.policy.recall_limit,
                self.policy.relevance_threshold,
            )
            .await
        {
            Ok(memories) => memories.into_iter().map(|stored| stored.memory).collect(),
            Err(err) => {
                warn!("memory retrieval failed: {err}");
                Vec::new()
            }
        }
    }

    /// Ask the model for memory candidates in the exchange, best-effort.
    async fn extract_memories(
        &self,
        user_message: &str,
        assistant_response: &str,
    ) -> Vec<crate::extract::MemoryCandidate> {
        info!("extracting memories from conversation");
        let request = [ChatMessage::system(prompt::extraction_prompt(
            user_message,
            assistant_response,
        ))];
        let raw = match self.llm.complete(&request).await {
            Ok(raw) => raw,
            Err(err) => {
                error!("error extracting memories: {err}");
                return Vec::new();
            }
        };
        debug!("memory extraction response: {raw}");
        parse_candidates(&raw)
    }

    /// Store extracted candidates: episodic under the user, semantic
    /// under the shared system scope. Failures are logged, never fatal.
    async fn store_candidates(
        &self,
        candidates: Vec<crate::extract::MemoryCandidate>,
        user_id: &str,
    ) {
        for candidate in candidates {
            let owner = match candidate.kind {
                MemoryKind::Episodic => Some(user_id),
                MemoryKind::Semantic => None,
            };
            match self
                .memory
                .store_memory(&candidate.content, candidate.kind, owner, None)
                .await
            {
                Ok(_) => info!(
                    "stored {} memory: {}",
                    candidate.kind.as_str().to_lowercase(),
                    candidate.content
                ),
                Err(err) => error!("failed to store memory: {err}"),
            }
        }
    }

    /// Compact the history to `[system prompt, summary, recent tail]`.
    ///
    /// The model summarizes the discarded middle; on failure the history
    /// is left untouched and the next turn tries again.
    async fn summarize(&self, history: &mut Vec<Message>, user_id: &str) {
        info!("summarizing conversation for user {user_id}");
        let Some(system_prompt) = history.first().cloned() else {
            return;
        };
        let tail_start = history.len().saturating_sub(self.policy.keep_recent);
        let recent = history[tail_start..].to_vec();
        let middle = &history[1..tail_start];

        let request = [
            ChatMessage::system(prompt::SUMMARY_INSTRUCTION),
            ChatMessage::system(prompt::summary_transcript(middle)),
        ];
        match self.llm.complete(&request).await {
            Ok(summary) => {
                history.clear();
                history.push(system_prompt);
                history.push(Message::system(format!("Conversation summary: {summary}")));
                history.extend(recent);
                info!("conversation summarized successfully");
            }
            Err(err) => error!("failed to summarize conversation: {err}"),
        }
    }
}

/// Elapsed milliseconds since `start`.
fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
