//! Text-to-speech (TTS) via a VOICEVOX-compatible engine
//!
//! Synthesis is a two-step protocol: the engine first builds an audio query
//! for the text and speaker, the query is tuned to the persona's voice, then
//! the engine renders it to WAV.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TtsConfig;
use crate::error::SynthesisStep;
use crate::persona;
use crate::{Error, Result};

/// Timeout for building the audio query
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for rendering audio (slower than the query step)
pub const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Sample rate assumed for duration estimates
pub const ASSUMED_SAMPLE_RATE: u64 = 44_100;

/// Bytes per sample assumed for duration estimates (16-bit mono)
pub const ASSUMED_BYTES_PER_SAMPLE: u64 = 2;

/// Rendered speech
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// WAV bytes as returned by the engine
    pub audio: Vec<u8>,

    /// Approximate playback length, estimated from the byte count
    pub duration_ms: u64,
}

/// Audio query as returned by `/audio_query`
///
/// Only the fields the gateway tunes are typed; everything else is passed
/// back to the engine untouched.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioQuery {
    #[serde(default)]
    speed_scale: f64,
    #[serde(default)]
    pitch_scale: f64,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct QueryParams<'a> {
    text: &'a str,
    speaker: i64,
}

#[derive(Debug, Serialize)]
struct SynthesisParams {
    speaker: i64,
}

/// Client for the speech synthesis engine
pub struct SynthesisClient {
    client: reqwest::Client,
    base_url: String,
    speed_scale: f64,
    pitch_scale: f64,
    query_timeout: Duration,
    synthesis_timeout: Duration,
}

impl SynthesisClient {
    /// Create a client for the engine at `config.base_url`
    #[must_use]
    pub fn new(config: &TtsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            speed_scale: persona::SPEED_SCALE,
            pitch_scale: persona::PITCH_SCALE,
            query_timeout: QUERY_TIMEOUT,
            synthesis_timeout: SYNTHESIS_TIMEOUT,
        }
    }

    /// Override the per-step timeouts
    #[must_use]
    pub fn with_timeouts(mut self, query: Duration, synthesis: Duration) -> Self {
        self.query_timeout = query;
        self.synthesis_timeout = synthesis;
        self
    }

    /// Engine base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Synthesize `text` with the given speaker
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] naming the failed step; no partial audio
    /// is ever returned
    pub async fn synthesize(&self, text: &str, speaker_id: i64) -> Result<SpeechAudio> {
        let mut query = self.audio_query(text, speaker_id).await?;
        query.speed_scale = self.speed_scale;
        query.pitch_scale = self.pitch_scale;

        let audio = self.render(&query, speaker_id).await?;
        let duration_ms = estimate_duration_ms(audio.len());

        tracing::debug!(
            speaker_id,
            bytes = audio.len(),
            duration_ms,
            "speech synthesized"
        );

        Ok(SpeechAudio { audio, duration_ms })
    }

    async fn audio_query(&self, text: &str, speaker: i64) -> Result<AudioQuery> {
        let step = SynthesisStep::AudioQuery;
        let response = self
            .client
            .post(format!("{}/audio_query", self.base_url))
            .query(&QueryParams { text, speaker })
            .timeout(self.query_timeout)
            .send()
            .await
            .map_err(|e| transport_error(step, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(step, status));
        }

        response.json().await.map_err(|e| {
            tracing::warn!(step = %step, error = %e, "undecodable audio query");
            Error::Synthesis { step, status: None }
        })
    }

    async fn render(&self, query: &AudioQuery, speaker: i64) -> Result<Vec<u8>> {
        let step = SynthesisStep::Synthesis;
        let response = self
            .client
            .post(format!("{}/synthesis", self.base_url))
            .query(&SynthesisParams { speaker })
            .json(query)
            .timeout(self.synthesis_timeout)
            .send()
            .await
            .map_err(|e| transport_error(step, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(step, status));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| transport_error(step, &e))?;
        Ok(audio.to_vec())
    }
}

/// Estimate playback length from a byte count (16-bit mono at 44.1 kHz)
///
/// Header bytes are counted as audio, so this is an approximation.
#[must_use]
pub fn estimate_duration_ms(len: usize) -> u64 {
    let len = u64::try_from(len).unwrap_or(u64::MAX);
    len.saturating_mul(1000) / (ASSUMED_SAMPLE_RATE * ASSUMED_BYTES_PER_SAMPLE)
}

fn transport_error(step: SynthesisStep, error: &reqwest::Error) -> Error {
    tracing::warn!(step = %step, error = %error, "synthesis engine unreachable");
    Error::Synthesis { step, status: None }
}

fn status_error(step: SynthesisStep, status: reqwest::StatusCode) -> Error {
    tracing::warn!(step = %step, status = status.as_u16(), "synthesis engine returned error");
    Error::Synthesis {
        step,
        status: Some(status.as_u16()),
    }
}
