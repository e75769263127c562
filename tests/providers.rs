//! Upstream protocol contract tests against mock servers

use std::sync::Arc;
use std::time::Duration;

use coro_gateway::config::{ProviderConfig, TtsConfig};
use coro_gateway::{
    AnthropicClient, ChatOrchestrator, ChatProvider, ConversationStore, Error, OpenAiClient,
    SynthesisClient, SynthesisStep, Turn, persona,
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{anthropic_reply, audio_query, openai_reply};

fn provider(server: &MockServer, model: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: SecretString::from("test-key".to_string()),
        model: model.to_string(),
        base_url: server.uri(),
    }
}

// ---- anthropic ----

#[tokio::test]
async fn test_anthropic_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-test",
            "max_tokens": 256,
            "system": "be brief",
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("やあナリ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&provider(&server, "claude-test")).unwrap();
    let reply = client.complete("be brief", &[Turn::user("hi")]).await.unwrap();

    assert_eq!(reply, "やあナリ");
}

#[tokio::test]
async fn test_anthropic_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&provider(&server, "claude-test")).unwrap();
    let err = client.complete("sys", &[Turn::user("hi")]).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Upstream {
            provider: "anthropic",
            status: 529
        }
    ));
}

#[tokio::test]
async fn test_anthropic_reply_without_text_block() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&provider(&server, "claude-test")).unwrap();
    let err = client.complete("sys", &[Turn::user("hi")]).await.unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
}

#[tokio::test]
async fn test_primary_sends_history_and_commits_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_reply("げんきナリ")))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&provider(&server, "claude-test")).unwrap();
    let orchestrator =
        ChatOrchestrator::new(ConversationStore::default()).with_primary(Arc::new(client));

    orchestrator.converse("first").await;
    let reply = orchestrator.converse("second").await;
    assert_eq!(reply.text, "げんきナリ");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(
        body["messages"],
        json!([
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "げんきナリ"},
            {"role": "user", "content": "second"}
        ])
    );
    assert_eq!(body["system"], persona::SYSTEM_PROMPT);
    assert_eq!(orchestrator.history().await.len(), 4);
}

#[tokio::test]
async fn test_primary_failure_is_spoken_and_not_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&provider(&server, "claude-test")).unwrap();
    let orchestrator =
        ChatOrchestrator::new(ConversationStore::default()).with_primary(Arc::new(client));

    let reply = orchestrator.converse("hi").await;

    assert_eq!(reply.text, persona::upstream_failure(500));
    assert!(reply.text.contains("500"));
    assert!(orchestrator.history().await.is_empty());
}

#[tokio::test]
async fn test_anthropic_timeout_is_spoken_as_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(anthropic_reply("おそいナリ"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&provider(&server, "claude-test"))
        .unwrap()
        .with_timeout(Duration::from_millis(100));
    let err = client.complete("sys", &[Turn::user("hi")]).await.unwrap_err();
    assert!(matches!(&err, Error::Http(e) if e.is_timeout()));

    let orchestrator =
        ChatOrchestrator::new(ConversationStore::default()).with_primary(Arc::new(client));
    let reply = orchestrator.converse("hi").await;
    assert!(reply.text.starts_with(&persona::transport_failure("")));
    assert!(orchestrator.history().await.is_empty());
}

// ---- openai ----

#[tokio::test]
async fn test_openai_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "max_tokens": 256,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("はいナリ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&provider(&server, "gpt-test")).unwrap();
    let reply = client.complete("be brief", &[Turn::user("hi")]).await.unwrap();

    assert_eq!(reply, "はいナリ");
}

#[tokio::test]
async fn test_openai_fallback_is_single_shot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("はいナリ")))
        .expect(2)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&provider(&server, "gpt-test")).unwrap();
    let orchestrator =
        ChatOrchestrator::new(ConversationStore::default()).with_secondary(Arc::new(client));

    orchestrator.converse("first").await;
    orchestrator.converse("second").await;

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][1]["content"], "second");
    assert!(orchestrator.history().await.is_empty());
}

#[tokio::test]
async fn test_openai_failure_uses_same_diagnostic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(&provider(&server, "gpt-test")).unwrap();
    let orchestrator =
        ChatOrchestrator::new(ConversationStore::default()).with_secondary(Arc::new(client));

    let reply = orchestrator.converse("hi").await;
    assert_eq!(reply.text, persona::upstream_failure(401));
}

// ---- synthesis engine ----

fn synthesizer(server: &MockServer) -> SynthesisClient {
    SynthesisClient::new(&TtsConfig {
        base_url: server.uri(),
        speaker_id: 3,
    })
}

#[tokio::test]
async fn test_synthesis_protocol() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio_query"))
        .and(query_param("text", "こんにちは"))
        .and(query_param("speaker", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(audio_query()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/synthesis"))
        .and(query_param("speaker", "3"))
        .and(body_partial_json(json!({
            "speedScale": 1.2,
            "pitchScale": 0.05,
            "intonationScale": 1.0,
            "outputSamplingRate": 24000,
            "kana": "コンニチワ"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 88_200]))
        .expect(1)
        .mount(&server)
        .await;

    let speech = synthesizer(&server).synthesize("こんにちは", 3).await.unwrap();

    assert_eq!(speech.audio.len(), 88_200);
    assert_eq!(speech.duration_ms, 1000);
}

#[tokio::test]
async fn test_synthesis_query_step_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio_query"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/synthesis"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = synthesizer(&server).synthesize("hi", 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Synthesis {
            step: SynthesisStep::AudioQuery,
            status: Some(422)
        }
    ));
}

#[tokio::test]
async fn test_synthesis_render_step_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(audio_query()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/synthesis"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = synthesizer(&server).synthesize("hi", 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Synthesis {
            step: SynthesisStep::Synthesis,
            status: Some(500)
        }
    ));
    assert_eq!(err.to_string(), "synthesis failed at synthesis (status: 500)");
}

#[tokio::test]
async fn test_synthesis_undecodable_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio_query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = synthesizer(&server).synthesize("hi", 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Synthesis {
            step: SynthesisStep::AudioQuery,
            status: None
        }
    ));
}

#[tokio::test]
async fn test_synthesis_query_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio_query"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(audio_query())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = synthesizer(&server)
        .with_timeouts(Duration::from_millis(100), Duration::from_secs(5));
    let err = client.synthesize("hi", 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Synthesis {
            step: SynthesisStep::AudioQuery,
            status: None
        }
    ));
}

#[tokio::test]
async fn test_synthesis_render_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio_query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(audio_query()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/synthesis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0u8; 16])
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = synthesizer(&server)
        .with_timeouts(Duration::from_secs(5), Duration::from_millis(100));
    let err = client.synthesize("hi", 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Synthesis {
            step: SynthesisStep::Synthesis,
            status: None
        }
    ));
}

#[tokio::test]
async fn test_synthesis_engine_unreachable() {
    let client = SynthesisClient::new(&TtsConfig {
        base_url: common::DEAD_TTS_URL.to_string(),
        speaker_id: 3,
    });

    let err = client.synthesize("hi", 3).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Synthesis {
            step: SynthesisStep::AudioQuery,
            status: None
        }
    ));
}
