//! Conversation turn integration tests.

use mnemo_core::{
    ChatOrchestrator, ChatPolicy, ConversationCache, ConversationStore, CoreError,
    MemoryConversationStore, Role,
};
use mnemo_llm::ChatProvider;
use mnemo_memory::{InMemoryVectorStore, MemoryKind, MemoryService};
use mnemo_test_utils::{FailingChat, ScriptedChat, StaticEmbedding};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    orchestrator: ChatOrchestrator,
    vectors: Arc<InMemoryVectorStore>,
    memory: Arc<MemoryService>,
    store: Arc<MemoryConversationStore>,
}

fn fixture(llm: Arc<dyn ChatProvider>, embedder: Arc<StaticEmbedding>) -> Fixture {
    let vectors = Arc::new(InMemoryVectorStore::new(embedder));
    let memory = Arc::new(MemoryService::new(vectors.clone(), 0.9));
    let store = Arc::new(MemoryConversationStore::new(Duration::from_secs(3600)));
    let orchestrator = ChatOrchestrator::new(
        llm,
        memory.clone(),
        store.clone(),
        Arc::new(ConversationCache::new()),
        ChatPolicy::default(),
    );
    Fixture {
        orchestrator,
        vectors,
        memory,
        store,
    }
}

fn orthogonal_embedder() -> Arc<StaticEmbedding> {
    Arc::new(StaticEmbedding::new(vec![0.0, 0.0, 1.0]))
}

#[tokio::test]
async fn first_turn_seeds_system_prompt() {
    let chat = Arc::new(ScriptedChat::new("[]").with_queued("Happy to help!"));
    let fx = fixture(chat.clone(), orthogonal_embedder());

    let turn = fx
        .orchestrator
        .send_message("Plan me a trip to Rome", "alice")
        .await
        .expect("turn");
    assert_eq!(turn.response, "Happy to help!");

    let history = fx.orchestrator.history("alice").await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::System);
    assert!(history[0].content.starts_with("You are a travel assistant"));
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[1].content, "Plan me a trip to Rome");
    assert_eq!(history[2].role, Role::Assistant);

    // Completion plus extraction: two model calls.
    assert_eq!(chat.call_count(), 2);
}

#[tokio::test]
async fn extracted_episodic_memory_is_stored_and_scoped() {
    // Cosines against the stored memory vector [1,0,0]:
    // relevant query 0.5, irrelevant query 0.2.
    let embedder = Arc::new(
        StaticEmbedding::new(vec![0.0, 0.0, 1.0])
            .with_vector("User prefers window seats", vec![1.0, 0.0, 0.0])
            .with_vector("what seat does alice like", vec![0.5, 0.866_025_4, 0.0])
            .with_vector("seat preference?", vec![0.2, 0.979_795_9, 0.0]),
    );
    let chat = Arc::new(
        ScriptedChat::new("[]")
            .with_queued("Window seats noted!")
            .with_queued(r#"[{"type":"EPISODIC","content":"User prefers window seats"}]"#),
    );
    let fx = fixture(chat, embedder);

    fx.orchestrator
        .send_message("I prefer window seats", "alice")
        .await
        .expect("turn");
    assert_eq!(fx.vectors.len(), 1);

    let relevant = fx
        .memory
        .retrieve_memories("what seat does alice like", None, Some("alice"), 5, 0.3)
        .await
        .expect("retrieve");
    assert_eq!(relevant.len(), 1);
    assert_eq!(relevant[0].memory.kind, MemoryKind::Episodic);
    assert_eq!(relevant[0].memory.user_id, "alice");
    assert_eq!(relevant[0].memory.content, "User prefers window seats");

    // Below the relevance floor: nothing comes back.
    let irrelevant = fx
        .memory
        .retrieve_memories("seat preference?", None, Some("alice"), 5, 0.3)
        .await
        .expect("retrieve");
    assert_eq!(irrelevant, Vec::new());

    // Episodic memories never leak to another user.
    let for_bob = fx
        .memory
        .retrieve_memories("what seat does alice like", None, Some("bob"), 5, 0.3)
        .await
        .expect("retrieve");
    assert_eq!(for_bob, Vec::new());
}

#[tokio::test]
async fn extracted_semantic_memory_is_shared() {
    let embedder = Arc::new(
        StaticEmbedding::new(vec![0.0, 0.0, 1.0])
            .with_vector("Singapore requires passport", vec![1.0, 0.0, 0.0])
            .with_vector("Do I need a passport for Singapore?", vec![0.8, 0.6, 0.0]),
    );
    let chat = Arc::new(
        ScriptedChat::new("[]")
            .with_queued("Yes, you need a passport.")
            .with_queued(r#"[{"type":"SEMANTIC","content":"Singapore requires passport"}]"#),
    );
    let fx = fixture(chat, embedder);

    fx.orchestrator
        .send_message("Tell me about Singapore entry rules", "alice")
        .await
        .expect("turn");

    let for_bob = fx
        .memory
        .retrieve_memories(
            "Do I need a passport for Singapore?",
            None,
            Some("bob"),
            5,
            0.3,
        )
        .await
        .expect("retrieve");
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0].memory.user_id, "system");
    assert_eq!(for_bob[0].memory.kind, MemoryKind::Semantic);
}

#[tokio::test]
async fn memory_context_is_appended_every_turn() {
    let embedder = Arc::new(
        StaticEmbedding::new(vec![0.0, 0.0, 1.0])
            .with_vector("User prefers window seats", vec![1.0, 0.0, 0.0])
            .with_vector("any seat tips?", vec![0.9, 0.435_889_9, 0.0]),
    );
    let chat = Arc::new(ScriptedChat::new("[]"));
    let fx = fixture(chat.clone(), embedder);

    fx.memory
        .store_memory(
            "User prefers window seats",
            MemoryKind::Episodic,
            Some("alice"),
            None,
        )
        .await
        .expect("seed memory");

    chat.queue("Window seat it is.");
    chat.queue("[]");
    fx.orchestrator
        .send_message("any seat tips?", "alice")
        .await
        .expect("turn one");

    chat.queue("Still window seats.");
    chat.queue("[]");
    fx.orchestrator
        .send_message("any seat tips?", "alice")
        .await
        .expect("turn two");

    let history = fx.orchestrator.history("alice").await;
    let context_blocks = history
        .iter()
        .filter(|message| {
            message.role == Role::System
                && message
                    .content
                    .starts_with("I have access to the following relevant memories")
        })
        .count();
    // The context block is re-injected each turn, not deduplicated.
    assert_eq!(context_blocks, 2);
    assert_eq!(history.len(), 7);
}

#[tokio::test]
async fn long_history_is_summarized_to_six_messages() {
    let chat = Arc::new(ScriptedChat::new("[]"));
    let fx = fixture(chat.clone(), orthogonal_embedder());

    for i in 1..=5 {
        chat.queue(format!("reply {i}"));
        chat.queue("[]");
    }
    chat.queue("A concise summary");

    for i in 1..=5 {
        fx.orchestrator
            .send_message(&format!("message {i}"), "alice")
            .await
            .expect("turn");
    }

    let history = fx.orchestrator.history("alice").await;
    assert_eq!(history.len(), 6);
    assert_eq!(history[0].role, Role::System);
    assert!(history[0].content.starts_with("You are a travel assistant"));
    assert_eq!(history[1].role, Role::System);
    assert_eq!(history[1].content, "Conversation summary: A concise summary");
    assert_eq!(history[2].content, "message 4");
    assert_eq!(history[3].content, "reply 4");
    assert_eq!(history[4].content, "message 5");
    assert_eq!(history[5].content, "reply 5");

    // The durable copy was rewritten with the compacted history.
    let persisted = fx.store.load("alice").await.expect("load");
    assert_eq!(persisted.len(), 6);
}

#[tokio::test]
async fn clear_history_is_idempotent() {
    let chat = Arc::new(ScriptedChat::new("[]").with_queued("Hello!"));
    let fx = fixture(chat.clone(), orthogonal_embedder());

    fx.orchestrator
        .send_message("hi", "alice")
        .await
        .expect("turn");
    assert_eq!(fx.orchestrator.history("alice").await.len(), 3);

    fx.orchestrator.clear_history("alice").await.expect("clear");
    assert_eq!(fx.orchestrator.history("alice").await, Vec::new());
    fx.orchestrator.clear_history("alice").await.expect("clear again");
    assert_eq!(fx.orchestrator.history("alice").await, Vec::new());

    // The next turn starts from a fresh seed.
    chat.queue("Fresh start!");
    chat.queue("[]");
    fx.orchestrator
        .send_message("hi again", "alice")
        .await
        .expect("turn");
    assert_eq!(fx.orchestrator.history("alice").await.len(), 3);
}

#[tokio::test]
async fn primary_completion_failure_fails_the_turn() {
    let fx = fixture(Arc::new(FailingChat), orthogonal_embedder());

    let err = fx
        .orchestrator
        .send_message("hello", "alice")
        .await
        .expect_err("model failure");
    match err {
        CoreError::Model(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    // Nothing was extracted or stored.
    assert_eq!(fx.vectors.len(), 0);
    assert_eq!(fx.store.load("alice").await.expect("load"), Vec::new());
}

#[tokio::test]
async fn history_is_restored_from_durable_store() {
    let chat = Arc::new(ScriptedChat::new("[]").with_queued("Sure thing."));
    let fx = fixture(chat.clone(), orthogonal_embedder());

    fx.orchestrator
        .send_message("remember me", "alice")
        .await
        .expect("turn");
    let original = fx.orchestrator.history("alice").await;

    // Fresh cache over the same durable store, as after a restart.
    let rebuilt = ChatOrchestrator::new(
        chat.clone(),
        fx.memory.clone(),
        fx.store.clone(),
        Arc::new(ConversationCache::new()),
        ChatPolicy::default(),
    );
    assert_eq!(rebuilt.history("alice").await, original);

    // The restored history is continued, not reseeded.
    chat.queue("Welcome back.");
    chat.queue("[]");
    rebuilt
        .send_message("back again", "alice")
        .await
        .expect("turn");
    assert_eq!(rebuilt.history("alice").await.len(), original.len() + 2);
}

#[tokio::test]
async fn history_miss_does_not_seed() {
    let fx = fixture(Arc::new(ScriptedChat::new("[]")), orthogonal_embedder());
    assert_eq!(fx.orchestrator.history("ghost").await, Vec::new());
}
