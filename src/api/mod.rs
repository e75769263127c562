//! HTTP API server for the Coro gateway

pub mod chat;
pub mod health;
pub mod rate_limit;
pub mod voice;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::commands::CommandRouter;
use crate::config::Config;
use crate::orchestrator::ChatOrchestrator;
use crate::pipeline::VoicePipeline;
use crate::voice::{AudioCache, SynthesisClient};
use crate::{Error, Result};

pub use websocket::{BroadcastReport, ClientRegistry, WsIncoming, WsOutgoing};

/// Shared state for API handlers
pub struct ApiState {
    pub pipeline: Arc<VoicePipeline>,
    pub commands: CommandRouter,
    pub clients: ClientRegistry,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

impl ApiState {
    /// Wrap a pipeline with a command router and an empty client registry
    #[must_use]
    pub fn new(pipeline: Arc<VoicePipeline>) -> Self {
        Self {
            commands: CommandRouter::new(Arc::clone(&pipeline)),
            pipeline,
            clients: ClientRegistry::default(),
            rate_limiter: None,
        }
    }

    /// Enable the global request limiter
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.rate_limiter = Some(rate_limit::create_limiter(requests_per_minute));
        self
    }

    /// Build every service from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the audio directory or an HTTP client cannot be set up
    pub async fn from_config(config: &Config) -> Result<Self> {
        let orchestrator = ChatOrchestrator::from_config(config)?;
        let synthesizer = SynthesisClient::new(&config.tts);
        let cache = AudioCache::open(&config.audio).await?;
        let pipeline = VoicePipeline::new(orchestrator, synthesizer, cache, config.tts.speaker_id);

        let state = Self::new(Arc::new(pipeline));
        Ok(match config.rate_limit_rpm {
            Some(rpm) => state.with_rate_limit(rpm),
            None => state,
        })
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let router = Router::new()
        .merge(health::router())
        .merge(chat::router(state.clone()))
        .merge(voice::router(state.clone()))
        .merge(voice::audio_router(state.clone()))
        .merge(websocket::router(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state,
            rate_limit::rate_limit_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    addr: String,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: Arc<ApiState>, addr: String) -> Self {
        Self { state, addr }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind {}: {e}", self.addr)))?;

        tracing::info!(addr = %self.addr, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
