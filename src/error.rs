//! Error types for the Coro gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline step of the synthesis engine protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisStep {
    /// Query construction (`/audio_query`)
    AudioQuery,
    /// Waveform synthesis (`/synthesis`)
    Synthesis,
}

impl SynthesisStep {
    /// Step name as reported in errors and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AudioQuery => "audio_query",
            Self::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for SynthesisStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in the gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider credential missing or provider not wired up
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Upstream returned a non-success status
    #[error("{provider} returned status {status}")]
    Upstream {
        provider: &'static str,
        status: u16,
    },

    /// Upstream payload could not be decoded
    #[error("parse error: {0}")]
    Parse(String),

    /// Synthesis engine failure at a given step
    #[error("synthesis failed at {step}{}", status.map(|s| format!(" (status: {s})")).unwrap_or_default())]
    Synthesis {
        step: SynthesisStep,
        status: Option<u16>,
    },

    /// Stream channel error (malformed frame, closed client)
    #[error("channel error: {0}")]
    Channel(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
