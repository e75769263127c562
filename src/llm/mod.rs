//! LLM provider clients
//!
//! Two providers are supported: Anthropic as primary (multi-turn, fed from
//! the shared conversation) and `OpenAI` as a single-shot fallback.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::conversation::Turn;

/// Timeout for a single completion request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A chat completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logs and errors
    fn name(&self) -> &'static str;

    /// Produce the assistant reply for `messages` under the `system` prompt
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or an
    /// undecodable response body
    async fn complete(&self, system: &str, messages: &[Turn]) -> Result<String>;
}

/// Build the HTTP client shared by the provider implementations
pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}
