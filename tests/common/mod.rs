//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use coro_gateway::api::{self, ApiState};
use coro_gateway::config::{AudioConfig, TtsConfig};
use coro_gateway::{AudioCache, ChatOrchestrator, Config, SynthesisClient, VoicePipeline};
use tower::ServiceExt;

/// A TTS address nothing listens on
pub const DEAD_TTS_URL: &str = "http://127.0.0.1:9";

/// Build API state around an explicit orchestrator
pub async fn build_state(
    audio_dir: &Path,
    orchestrator: ChatOrchestrator,
    tts_url: &str,
) -> Arc<ApiState> {
    let cache = AudioCache::open(&AudioConfig {
        dir: audio_dir.to_path_buf(),
        max_entries: None,
    })
    .await
    .expect("failed to open audio cache");
    let synthesizer = SynthesisClient::new(&TtsConfig {
        base_url: tts_url.to_string(),
        speaker_id: 3,
    });
    Arc::new(ApiState::new(Arc::new(VoicePipeline::new(
        orchestrator,
        synthesizer,
        cache,
        3,
    ))))
}

/// Build API state the way the binary does, from environment-style variables
pub async fn state_from_vars(vars: &[(&str, &str)]) -> Arc<ApiState> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let config = Config::from_lookup(|key| map.get(key).cloned()).expect("invalid test config");
    Arc::new(
        ApiState::from_config(&config)
            .await
            .expect("failed to build state"),
    )
}

/// Full application router
pub fn app(state: Arc<ApiState>) -> Router {
    api::router(state)
}

/// Send a request and decode the JSON body (Null when the body is not JSON)
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Anthropic-style success body
pub fn anthropic_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "model": "claude-3-haiku-20240307",
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
}

/// OpenAI-style success body
pub fn openai_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

/// Minimal audio query as a VOICEVOX engine returns it
pub fn audio_query() -> serde_json::Value {
    serde_json::json!({
        "accent_phrases": [],
        "speedScale": 1.0,
        "pitchScale": 0.0,
        "intonationScale": 1.0,
        "volumeScale": 1.0,
        "prePhonemeLength": 0.1,
        "postPhonemeLength": 0.1,
        "outputSamplingRate": 24000,
        "outputStereo": false,
        "kana": "コンニチワ"
    })
}
