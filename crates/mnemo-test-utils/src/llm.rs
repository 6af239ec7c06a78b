use async_trait::async_trait;
use mnemo_llm::{ChatMessage, ChatProvider, LlmError};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Chat provider returning queued responses in order, then a fixed
/// default. Every request prompt is recorded for assertions.
pub struct ScriptedChat {
    default_response: String,
    queued: Mutex<VecDeque<String>>,
    /// Prompts received, in call order.
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            default_response: default_response.into(),
            queued: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response ahead of the default.
    pub fn with_queued(self, response: impl Into<String>) -> Self {
        self.queued.lock().push_back(response.into());
        self
    }

    /// Queue a response on an existing provider.
    pub fn queue(&self, response: impl Into<String>) {
        self.queued.lock().push_back(response.into());
    }

    /// Number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls.lock().push(messages.to_vec());
        Ok(self
            .queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

/// Chat provider that always fails.
#[derive(Default)]
pub struct FailingChat;

#[async_trait]
impl ChatProvider for FailingChat {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        Err(LlmError::Provider("scripted failure".to_string()))
    }
}
