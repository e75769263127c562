//! Conversation endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::commands::CommandOutcome;
use crate::expression::Expression;
use crate::pipeline::SpokenReply;

/// Build conversation router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat_and_speak", post(chat_and_speak))
        .route("/command", post(command))
        .route("/expressions", get(expressions))
        .with_state(state)
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Client-side context; the gateway keeps its own history and ignores it
    #[serde(default)]
    pub context: Option<Vec<serde_json::Value>>,
}

/// Text-only chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub expression: Expression,
    pub audio_url: Option<String>,
}

/// Command request
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// Available expressions
#[derive(Debug, Serialize)]
pub struct ExpressionsResponse {
    pub expressions: [Expression; 8],
}

async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    if request.context.is_some() {
        tracing::trace!("ignoring client-supplied context");
    }

    let reply = state.pipeline.chat(&request.message).await;
    Json(ChatResponse {
        response: reply.text,
        expression: reply.expression,
        audio_url: None,
    })
}

async fn chat_and_speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Json<SpokenReply> {
    Json(state.pipeline.chat_and_speak(&request.message).await)
}

async fn command(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandOutcome> {
    Json(
        state
            .commands
            .dispatch(&request.command, request.params.as_ref())
            .await,
    )
}

async fn expressions() -> Json<ExpressionsResponse> {
    Json(ExpressionsResponse {
        expressions: Expression::ALL,
    })
}
