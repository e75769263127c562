//! Chat orchestration
//!
//! Picks a provider (primary, then fallback, then a canned reply), keeps the
//! shared conversation in sync with the primary provider and labels every
//! reply with an expression. Chat never fails: provider errors become a
//! spoken diagnostic so the robot always says something.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::conversation::{ConversationStore, Turn};
use crate::expression::{self, Expression};
use crate::llm::{AnthropicClient, ChatProvider, OpenAiClient};
use crate::{Error, Result, persona};

/// Reply text plus its derived expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub expression: Expression,
}

impl Reply {
    fn new(text: String) -> Self {
        let expression = expression::classify(&text);
        Self { text, expression }
    }
}

/// Owns the shared conversation and the provider chain
pub struct ChatOrchestrator {
    primary: Option<Arc<dyn ChatProvider>>,
    secondary: Option<Arc<dyn ChatProvider>>,
    store: Mutex<ConversationStore>,
    system_prompt: String,
}

impl ChatOrchestrator {
    /// Create an orchestrator with no providers
    #[must_use]
    pub fn new(store: ConversationStore) -> Self {
        Self {
            primary: None,
            secondary: None,
            store: Mutex::new(store),
            system_prompt: persona::SYSTEM_PROMPT.to_string(),
        }
    }

    /// Build the provider chain from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a provider HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut orchestrator = Self::new(ConversationStore::new(config.max_history));
        if let Some(anthropic) = &config.anthropic {
            orchestrator = orchestrator.with_primary(Arc::new(AnthropicClient::new(anthropic)?));
        }
        if let Some(openai) = &config.openai {
            orchestrator = orchestrator.with_secondary(Arc::new(OpenAiClient::new(openai)?));
        }
        Ok(orchestrator)
    }

    /// Set the primary (history-aware) provider
    #[must_use]
    pub fn with_primary(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    /// Set the single-shot fallback provider
    #[must_use]
    pub fn with_secondary(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// Override the persona system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Names of the configured providers, primary first
    #[must_use]
    pub fn providers(&self) -> Vec<&'static str> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(|p| p.name())
            .collect()
    }

    /// Converse using the full fallback chain
    pub async fn converse(&self, text: &str) -> Reply {
        self.converse_or(text, persona::NO_PROVIDER_REPLY).await
    }

    /// Converse, answering `default_reply` when no provider is configured
    pub async fn converse_or(&self, text: &str, default_reply: &str) -> Reply {
        let reply = if let Some(primary) = &self.primary {
            self.converse_primary(primary.as_ref(), text).await
        } else if let Some(secondary) = &self.secondary {
            self.converse_single_shot(secondary.as_ref(), text).await
        } else {
            tracing::debug!("no LLM provider configured, using default reply");
            default_reply.to_string()
        };
        Reply::new(reply)
    }

    /// Clear the shared conversation
    pub async fn reset(&self) {
        self.store.lock().await.reset();
        tracing::info!("conversation history reset");
    }

    /// Copy of the shared conversation
    pub async fn history(&self) -> Vec<Turn> {
        self.store.lock().await.snapshot()
    }

    async fn converse_primary(&self, provider: &dyn ChatProvider, text: &str) -> String {
        // Held across the provider call so concurrent chats cannot interleave
        let mut store = self.store.lock().await;

        let user = Turn::user(text);
        let mut context = store.snapshot();
        context.push(user.clone());

        match provider.complete(&self.system_prompt, &context).await {
            Ok(reply) => {
                store.append_exchange(user, Turn::assistant(reply.clone()));
                tracing::debug!(provider = provider.name(), turns = store.len(), "chat turn committed");
                reply
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "chat request failed");
                failure_reply(&e)
            }
        }
    }

    async fn converse_single_shot(&self, provider: &dyn ChatProvider, text: &str) -> String {
        match provider.complete(&self.system_prompt, &[Turn::user(text)]).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "chat request failed");
                failure_reply(&e)
            }
        }
    }
}

fn failure_reply(error: &Error) -> String {
    match error {
        Error::Upstream { status, .. } => persona::upstream_failure(*status),
        other => persona::transport_failure(&other.to_string()),
    }
}
