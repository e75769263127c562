//! Bounded conversation history
//!
//! A single ordered log of user/assistant turns shared by every chat request.
//! The store keeps at most `2 * max_history` turns and drops the oldest first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default turn-pair cap
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, size-capped turn log
#[derive(Debug)]
pub struct ConversationStore {
    turns: VecDeque<Turn>,
    max_history: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ConversationStore {
    /// Create an empty store holding at most `2 * max_history` turns
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_history.saturating_mul(2) + 1),
            max_history,
        }
    }

    /// Maximum number of retained turns
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_history.saturating_mul(2)
    }

    /// Append a turn, trimming the oldest turns past the cap
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity() {
            self.turns.pop_front();
        }
    }

    /// Append an exchange as a unit (user turn, then assistant turn)
    pub fn append_exchange(&mut self, user: Turn, assistant: Turn) {
        self.append(user);
        self.append(assistant);
    }

    /// Clear all history
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    /// Copy of the current history in chronological order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
