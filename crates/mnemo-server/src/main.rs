//! HTTP surface for the mnemo chat service.

use anyhow::Result;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use clap::Parser;
use log::{error, info};
use mnemo_config::MnemoConfig;
use mnemo_core::{
    ChatOrchestrator, ChatPolicy, ChatTurn, ConversationCache, ConversationStore, CoreError,
    FileConversationStore, MemoryConversationStore, Message,
};
use mnemo_llm::OpenAiProvider;
use mnemo_memory::{InMemoryVectorStore, Memory, MemoryService};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// Memories listed by the admin endpoint: wide net, shallow floor.
const ADMIN_RETRIEVE_LIMIT: usize = 50;
const ADMIN_RETRIEVE_THRESHOLD: f32 = 0.1;

#[derive(Debug, Parser)]
#[command(name = "mnemo-server")]
#[command(about = "Agent-memory chat service")]
struct Cli {
    /// Path to a JSON5 config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured listen address.
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<ChatOrchestrator>,
    memory: Arc<MemoryService>,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Debug, Deserialize, Default)]
struct MemoryQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    message: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match err {
            CoreError::Model(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("request failed ({}): {}", self.status, self.message);
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn send_message(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    Json(request): Json<SendRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let turn = state
        .orchestrator
        .send_message(&request.message, &query.user_id)
        .await?;
    Ok(Json(turn))
}

async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<Message>> {
    Json(state.orchestrator.history(&query.user_id).await)
}

async fn clear_history(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.orchestrator.clear_history(&query.user_id).await?;
    Ok(Json(json!({ "status": "success" })))
}

async fn retrieve_memories(
    State(state): State<AppState>,
    Query(query): Query<MemoryQuery>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    let memories = state
        .memory
        .retrieve_memories(
            "",
            None,
            query.user_id.as_deref(),
            ADMIN_RETRIEVE_LIMIT,
            ADMIN_RETRIEVE_THRESHOLD,
        )
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Json(
        memories.into_iter().map(|stored| stored.memory).collect(),
    ))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/send", post(send_message))
        .route("/api/chat/history", get(get_history).delete(clear_history))
        .route("/api/memory/retrieve", get(retrieve_memories))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_state(config: &MnemoConfig) -> Result<AppState> {
    let mut provider = OpenAiProvider::new(
        config.llm.chat_model.clone(),
        config.llm.embedding_model.clone(),
    )?
    .with_base_url(config.llm.base_url.clone());
    if let Ok(api_key) = std::env::var(&config.llm.api_key_env) {
        provider = provider.with_api_key(api_key);
    }
    let provider = Arc::new(provider);

    let vectors = Arc::new(InMemoryVectorStore::new(provider.clone()));
    let memory = Arc::new(MemoryService::new(
        vectors,
        config.memory.dedup_threshold,
    ));

    let ttl = Duration::from_secs(config.conversation.ttl_secs);
    let store: Arc<dyn ConversationStore> = match &config.conversation.path {
        Some(path) => Arc::new(FileConversationStore::new(path, ttl)?),
        None => Arc::new(MemoryConversationStore::new(ttl)),
    };

    let orchestrator = Arc::new(ChatOrchestrator::new(
        provider,
        memory.clone(),
        store,
        Arc::new(ConversationCache::new()),
        ChatPolicy::from_config(config),
    ));
    Ok(AppState {
        orchestrator,
        memory,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MnemoConfig::load_from_path(path)?,
        None => MnemoConfig::default(),
    };
    let listen: SocketAddr = match cli.listen {
        Some(listen) => listen,
        None => config.server.listen.parse()?,
    };

    let state = build_state(&config)?;
    let app = router(state);

    info!("listening on {listen}");
    let listener = tokio::net::TcpListener::bind(listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
