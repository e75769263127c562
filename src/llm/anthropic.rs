//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ChatProvider, REQUEST_TIMEOUT, http_client};
use crate::config::ProviderConfig;
use crate::conversation::Turn;
use crate::persona::MAX_REPLY_TOKENS;
use crate::{Error, Result};

const API_VERSION: &str = "2023-06-01";

/// Primary chat provider
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
    timeout: Duration,
}

/// Messages API request
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Turn],
}

/// Messages API response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ResponseContent>,
}

/// Response content block
#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl AnthropicClient {
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
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
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
impl ChatProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, system: &str, messages: &[Turn]) -> Result<String> {
        let request = MessageRequest {
            model: &self.model,
            max_tokens: MAX_REPLY_TOKENS,
            system,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "anthropic request failed");
            return Err(Error::Upstream {
                provider: self.name(),
                status: status.as_u16(),
            });
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("anthropic response: {e}")))?;

        result
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text)
            .ok_or_else(|| Error::Parse("anthropic response has no text block".to_string()))
    }
}
