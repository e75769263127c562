//! Chat + speech pipeline
//!
//! Composes the orchestrator, synthesis client and audio cache into the
//! operations the HTTP facade and the command router expose.

use serde::Serialize;

use crate::Result;
use crate::expression::Expression;
use crate::orchestrator::{ChatOrchestrator, Reply};
use crate::persona;
use crate::voice::{AudioCache, SynthesisClient, estimate_duration_ms};

/// Rendered speech reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechClip {
    pub audio_url: String,
    pub duration_ms: u64,
}

/// Reply bundle with optional audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpokenReply {
    pub response: String,
    pub expression: Expression,
    pub audio_url: Option<String>,
    pub duration_ms: u64,
}

/// Conversation and speech services behind the gateway
pub struct VoicePipeline {
    orchestrator: ChatOrchestrator,
    synthesizer: SynthesisClient,
    cache: AudioCache,
    default_speaker: i64,
}

impl VoicePipeline {
    #[must_use]
    pub const fn new(
        orchestrator: ChatOrchestrator,
        synthesizer: SynthesisClient,
        cache: AudioCache,
        default_speaker: i64,
    ) -> Self {
        Self {
            orchestrator,
            synthesizer,
            cache,
            default_speaker,
        }
    }

    #[must_use]
    pub const fn orchestrator(&self) -> &ChatOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub const fn cache(&self) -> &AudioCache {
        &self.cache
    }

    #[must_use]
    pub const fn synthesizer(&self) -> &SynthesisClient {
        &self.synthesizer
    }

    #[must_use]
    pub const fn default_speaker(&self) -> i64 {
        self.default_speaker
    }

    /// Text-only chat
    pub async fn chat(&self, message: &str) -> Reply {
        self.orchestrator.converse(message).await
    }

    /// Synthesize `text` and cache the audio
    ///
    /// Text already rendered for the same speaker is served from the cache
    /// without calling the engine.
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails or the audio cannot be written
    pub async fn speak(&self, text: &str, speaker_id: Option<i64>) -> Result<SpeechClip> {
        let speaker = speaker_id.unwrap_or(self.default_speaker);
        let cache_text = self.cache_text(text, speaker);

        if let Some((audio_url, len)) = self.cache.lookup(&cache_text).await {
            tracing::debug!(url = %audio_url, "serving cached speech");
            return Ok(SpeechClip {
                audio_url,
                duration_ms: estimate_duration_ms(usize::try_from(len).unwrap_or(usize::MAX)),
            });
        }

        let speech = self.synthesizer.synthesize(text, speaker).await?;
        let audio_url = self.cache.store(&cache_text, &speech.audio).await?;

        Ok(SpeechClip {
            audio_url,
            duration_ms: speech.duration_ms,
        })
    }

    /// Chat, then speak the reply
    ///
    /// Speech failures degrade to a reply without audio.
    pub async fn chat_and_speak(&self, message: &str) -> SpokenReply {
        let reply = self
            .orchestrator
            .converse_or(message, persona::NO_PROVIDER_SHORT_REPLY)
            .await;

        let (audio_url, duration_ms) = match self.speak(&reply.text, None).await {
            Ok(clip) => (Some(clip.audio_url), clip.duration_ms),
            Err(e) => {
                tracing::warn!(error = %e, "speech unavailable, replying with text only");
                (None, 0)
            }
        };

        SpokenReply {
            response: reply.text,
            expression: reply.expression,
            audio_url,
            duration_ms,
        }
    }

    // Non-default speakers get their own cache entries
    fn cache_text(&self, text: &str, speaker: i64) -> String {
        if speaker == self.default_speaker {
            text.to_string()
        } else {
            format!("{speaker}:{text}")
        }
    }
}
