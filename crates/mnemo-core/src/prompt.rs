//! Prompt texts used by the orchestrator.

use crate::types::{Message, Role};
use mnemo_memory::Memory;

/// Default system prompt for the travel assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a travel assistant helping users plan their trips. You remember user preferences
and provide personalized recommendations based on past interactions.

You have access to the following types of memory:
1. Short-term memory: The current conversation thread
2. Long-term memory:
   - Episodic: User preferences and past trip experiences (e.g., \"User prefers window seats\")
   - Semantic: General knowledge about travel destinations and requirements

Always be helpful, personal, and context-aware in your responses.

Always answer in text format. No markdown or special formatting.";

/// Instruction for the summarization call.
pub const SUMMARY_INSTRUCTION: &str = "\
Summarize the key points of this conversation, including:
1. User preferences and important details
2. Topics discussed
3. Any decisions or conclusions reached

Keep the summary concise but informative.";

/// Format retrieved memories as a system-message context block.
///
/// The memories are offered for personalization but the assistant is told
/// not to cite them.
pub fn memory_context(memories: &[Memory]) -> String {
    let formatted = memories
        .iter()
        .map(|memory| format!("- [{}] {}", memory.kind.as_str(), memory.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "I have access to the following relevant memories about this user or topic:\n\n\
         {formatted}\n\n\
         Use this information to personalize your response, but don't explicitly mention\n\
         that you're using stored memories unless directly asked about your memory capabilities."
    )
}

/// Build the extraction instruction for one (user, assistant) exchange.
pub fn extraction_prompt(user_message: &str, assistant_response: &str) -> String {
    format!(
        "Analyze the following conversation and extract potential memories.\n\n\
         USER MESSAGE:\n\
         {user_message}\n\n\
         ASSISTANT RESPONSE:\n\
         {assistant_response}\n\n\
         Extract two types of memories:\n\n\
         1. EPISODIC MEMORIES: Personal experiences and user-specific preferences\n\
         \x20  Examples: \"User prefers Delta airlines\", \"User visited Paris last year\"\n\n\
         2. SEMANTIC MEMORIES: General domain knowledge and facts\n\
         \x20  Examples: \"Singapore requires passport\", \"Tokyo has excellent public transit\"\n\n\
         Format your response as a JSON array with objects containing:\n\
         - \"type\": Either \"EPISODIC\" or \"SEMANTIC\"\n\
         - \"content\": The memory content\n\n\
         Only extract clear, factual information. Do not make assumptions or infer information \
         that isn't explicitly stated.\n\
         If no memories can be extracted, return an empty array.\n\n\
         Response format example:\n\
         [\n\
         \x20 {{\"type\": \"EPISODIC\", \"content\": \"User prefers window seats on flights\"}},\n\
         \x20 {{\"type\": \"SEMANTIC\", \"content\": \"Paris is known for the Eiffel Tower\"}}\n\
         ]"
    )
}

/// Render user/assistant turns as a plain transcript for summarization.
///
/// System messages (prompt seeds, memory context, earlier summaries) are
/// left out.
pub fn summary_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter_map(|message| match message.role {
            Role::User => Some(format!("User: {}", message.content)),
            Role::Assistant => Some(format!("Assistant: {}", message.content)),
            Role::System => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
