//! `OpenAI` Chat Completions client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ChatProvider, REQUEST_TIMEOUT, http_client};
use crate::config::ProviderConfig;
use crate::conversation::Turn;
use crate::persona::MAX_REPLY_TOKENS;
use crate::{Error, Result};

/// Fallback chat provider
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client from provider settings
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
            model: config.model.clone(),
            timeout: REQUEST_TIMEOUT,
            endpoint: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
        })
    }

    /// Override the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, system: &str, messages: &[Turn]) -> Result<String> {
        let mut chat = Vec::with_capacity(messages.len() + 1);
        chat.push(ChatMessage {
            role: "system",
            content: system,
        });
        chat.extend(messages.iter().map(|turn| ChatMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));

        let request = CompletionRequest {
            model: &self.model,
            max_tokens: MAX_REPLY_TOKENS,
            messages: chat,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "openai request failed");
            return Err(Error::Upstream {
                provider: self.name(),
                status: status.as_u16(),
            });
        }

        let result: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("openai response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Parse("openai response has no choices".to_string()))
    }
}
