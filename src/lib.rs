//! Coro Gateway - conversation and speech mediation for a talking robot
//!
//! The robot sends what it heard; the gateway asks an LLM for a reply, labels
//! the reply with a facial expression, optionally renders it to speech and
//! hands back a bundle the robot can act on.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Robot / HTTP clients                  │
//! │     /chat  /speak  /chat_and_speak  /command  /ws     │
//! └──────────────────────────┬───────────────────────────┘
//!                            │
//! ┌──────────────────────────▼───────────────────────────┐
//! │                     Coro Gateway                      │
//! │  Orchestrator │ Conversation │ Expressions │ Commands │
//! │        Synthesis client        │     Audio cache      │
//! └──────────────┬─────────────────┴──────────┬──────────┘
//!                │                            │
//! ┌──────────────▼──────────────┐ ┌───────────▼──────────┐
//! │ Anthropic → OpenAI fallback │ │  VOICEVOX-style TTS  │
//! └─────────────────────────────┘ └──────────────────────┘
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod expression;
pub mod llm;
pub mod orchestrator;
pub mod persona;
pub mod pipeline;
pub mod voice;

pub use commands::{Command, CommandOutcome, CommandRouter, CommandStatus};
pub use config::Config;
pub use conversation::{ConversationStore, Role, Turn};
pub use error::{Error, Result, SynthesisStep};
pub use expression::{Expression, classify};
pub use llm::{AnthropicClient, ChatProvider, OpenAiClient};
pub use orchestrator::{ChatOrchestrator, Reply};
pub use pipeline::{SpeechClip, SpokenReply, VoicePipeline};
pub use voice::{AudioCache, EvictionPolicy, SpeechAudio, SynthesisClient};
