//! Speech endpoints: synthesis and cached audio files

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;

use super::ApiState;
use crate::pipeline::SpeechClip;
use crate::voice::{URL_PREFIX, is_cache_file_name};

/// Build speech router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/speak", post(speak))
        .with_state(state)
}

/// Serve cached audio, recording each hit for eviction
pub fn audio_router(state: Arc<ApiState>) -> Router {
    let files = ServeDir::new(state.pipeline.cache().dir());
    Router::new()
        .nest_service(URL_PREFIX, files)
        .layer(axum::middleware::from_fn_with_state(state, record_audio_access))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    #[serde(default)]
    pub speaker_id: Option<i64>,
}

/// Synthesize text and return a reference to the cached audio
async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeechClip>, VoiceError> {
    if request.text.trim().is_empty() {
        return Err(VoiceError::BadRequest("Empty text"));
    }

    let clip = state
        .pipeline
        .speak(&request.text, request.speaker_id)
        .await
        .map_err(|e| VoiceError::SynthesisFailed(e.to_string()))?;

    Ok(Json(clip))
}

async fn record_audio_access(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Response {
    // Only finished `<digest>.wav` files are served; temp files stay hidden
    let name = req.uri().path().rsplit('/').next().unwrap_or_default();
    if !is_cache_file_name(name) {
        return StatusCode::NOT_FOUND.into_response();
    }

    state.pipeline.cache().touch(name).await;
    next.run(req).await
}

/// Speech API errors
#[derive(Debug)]
pub enum VoiceError {
    BadRequest(&'static str),
    SynthesisFailed(String),
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
            Self::SynthesisFailed(msg) => {
                tracing::warn!(error = %msg, "speak request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "synthesis_failed", msg)
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
