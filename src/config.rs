//! Configuration management for the Coro gateway
//!
//! Everything is read from environment variables (a `.env` file is loaded by
//! the binary first). Empty values count as unset.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use secrecy::SecretString;

use crate::conversation::DEFAULT_MAX_HISTORY;
use crate::persona;
use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_VOICEVOX_URL: &str = "http://localhost:50021";
pub const DEFAULT_AUDIO_DIR: &str = "audio_cache";

/// Gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Primary LLM provider (Anthropic), present when a key is set
    pub anthropic: Option<ProviderConfig>,

    /// Secondary LLM provider (`OpenAI`), present when a key is set
    pub openai: Option<ProviderConfig>,

    /// Speech synthesis engine
    pub tts: TtsConfig,

    /// Synthesized audio storage
    pub audio: AudioConfig,

    /// Turn-pair cap for the shared conversation
    pub max_history: usize,

    /// Optional global request budget per minute
    pub rate_limit_rpm: Option<u32>,
}

/// Connection settings for one LLM provider
#[derive(Debug)]
pub struct ProviderConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

/// Speech synthesis engine settings
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Engine base URL (e.g. `http://localhost:50021`)
    pub base_url: String,

    /// Speaker used when a request does not name one
    pub speaker_id: i64,
}

/// Audio cache settings
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Directory holding `<digest>.wav` files
    pub dir: PathBuf,

    /// LRU cap; `None` keeps every file
    pub max_entries: Option<NonZeroUsize>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VOICEVOX_URL.to_string(),
            speaker_id: persona::DEFAULT_SPEAKER_ID,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_AUDIO_DIR),
            max_entries: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable cannot be parsed
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = |key_var: &str, model_var: &str, url_var: &str, model: &str, url: &str| {
            get(key_var).map(|key| ProviderConfig {
                api_key: SecretString::from(key),
                model: get(model_var).unwrap_or_else(|| model.to_string()),
                base_url: get(url_var).unwrap_or_else(|| url.to_string()),
            })
        };

        let anthropic = provider(
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_MODEL",
            "ANTHROPIC_BASE_URL",
            DEFAULT_ANTHROPIC_MODEL,
            DEFAULT_ANTHROPIC_URL,
        );
        let openai = provider(
            "OPENAI_API_KEY",
            "OPENAI_MODEL",
            "OPENAI_BASE_URL",
            DEFAULT_OPENAI_MODEL,
            DEFAULT_OPENAI_URL,
        );

        let tts = TtsConfig {
            base_url: get("VOICEVOX_HOST").unwrap_or_else(|| DEFAULT_VOICEVOX_URL.to_string()),
            speaker_id: parse_var(get("SPEAKER_ID"), "SPEAKER_ID")?
                .unwrap_or(persona::DEFAULT_SPEAKER_ID),
        };

        let audio = AudioConfig {
            dir: get("AUDIO_DIR").map_or_else(|| PathBuf::from(DEFAULT_AUDIO_DIR), PathBuf::from),
            max_entries: parse_var(get("AUDIO_CACHE_MAX_ENTRIES"), "AUDIO_CACHE_MAX_ENTRIES")?,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(get("PORT"), "PORT")?.unwrap_or(DEFAULT_PORT),
            anthropic,
            openai,
            tts,
            audio,
            max_history: parse_var(get("MAX_HISTORY"), "MAX_HISTORY")?
                .unwrap_or(DEFAULT_MAX_HISTORY),
            rate_limit_rpm: parse_var(get("RATE_LIMIT_RPM"), "RATE_LIMIT_RPM")?,
        })
    }

    /// Bind address as `host:port`
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(value: Option<String>, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("invalid {name} '{v}': {e}")))
        })
        .transpose()
}
