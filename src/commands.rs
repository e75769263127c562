//! Robot control commands
//!
//! A small fixed vocabulary matched case-insensitively. Unknown commands are
//! an answer, not an error.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::persona;
use crate::pipeline::{SpokenReply, VoicePipeline};

/// Recognized commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Self-introduction through the chat + speech pipeline
    Greet,
    /// Static health answer
    Status,
    /// Clear the shared conversation
    Reset,
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greet" => Ok(Self::Greet),
            "status" => Ok(Self::Status),
            "reset" => Ok(Self::Reset),
            _ => Err(()),
        }
    }
}

/// Outcome of a non-speaking command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Ok,
    Unknown,
}

/// Command result payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandOutcome {
    /// Reply bundle from `greet`
    Spoken(SpokenReply),
    /// Status message from every other command
    Message {
        status: CommandStatus,
        message: String,
    },
}

impl CommandOutcome {
    fn message(status: CommandStatus, message: impl Into<String>) -> Self {
        Self::Message {
            status,
            message: message.into(),
        }
    }
}

/// Maps commands onto pipeline actions
#[derive(Clone)]
pub struct CommandRouter {
    pipeline: Arc<VoicePipeline>,
}

impl CommandRouter {
    #[must_use]
    pub const fn new(pipeline: Arc<VoicePipeline>) -> Self {
        Self { pipeline }
    }

    /// Run `command`; `params` are accepted for forward compatibility and unused
    pub async fn dispatch(&self, command: &str, _params: Option<&serde_json::Value>) -> CommandOutcome {
        let Ok(parsed) = command.parse::<Command>() else {
            let name = command.trim().to_lowercase();
            tracing::debug!(command = %name, "unknown command");
            return CommandOutcome::message(CommandStatus::Unknown, persona::unknown_command(&name));
        };

        tracing::info!(command = ?parsed, "dispatching command");
        match parsed {
            Command::Greet => CommandOutcome::Spoken(
                self.pipeline.chat_and_speak(persona::GREETING_PROMPT).await,
            ),
            Command::Status => CommandOutcome::message(CommandStatus::Ok, persona::STATUS_MESSAGE),
            Command::Reset => {
                self.pipeline.orchestrator().reset().await;
                CommandOutcome::message(CommandStatus::Ok, persona::RESET_MESSAGE)
            }
        }
    }
}
