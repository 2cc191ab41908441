//! Dialogue transcript: the ordered sequence of turns in a session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    /// Free text typed by the host
    Host,
    /// Conversational reply from the reasoning side
    Assistant,
    /// Notices about invitations, responses and decisions
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn host(content: impl Into<String>) -> Self {
        Self::with_role(TurnRole::Host, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(TurnRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(TurnRole::System, content)
    }

    fn with_role(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Host and assistant turns only; system notices are never sent to the oracle
    pub fn dialogue(&self) -> Vec<Turn> {
        self.turns
            .iter()
            .filter(|t| t.role != TurnRole::System)
            .cloned()
            .collect()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
