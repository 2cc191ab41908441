//! ReasoningOracle - turns dialogue and calendar data into proposals

use crate::entities::{Attendee, Proposal, Turn};
use crate::errors::OracleError;
use crate::value_objects::BusyInterval;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An attendee together with the intervals the directory reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeAvailability {
    pub attendee: Attendee,
    pub busy: Vec<BusyInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub title: String,
    pub attendees: Vec<AttendeeAvailability>,
    /// Prior host and assistant turns, oldest first
    pub transcript: Vec<Turn>,
    pub user_turn: String,
}

/// Either a clarifying question or a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub needs_more_info: bool,
    pub response_text: String,
    pub proposal: Option<Proposal>,
    #[serde(default)]
    pub lunch_recommendations: Vec<String>,
}

impl Interpretation {
    pub fn clarify(text: impl Into<String>) -> Self {
        Self {
            needs_more_info: true,
            response_text: text.into(),
            proposal: None,
            lunch_recommendations: Vec::new(),
        }
    }

    pub fn propose(text: impl Into<String>, proposal: Proposal) -> Self {
        Self {
            needs_more_info: false,
            response_text: text.into(),
            proposal: Some(proposal),
            lunch_recommendations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeRequest {
    pub title: String,
    pub attendees: Vec<AttendeeAvailability>,
    pub current: Proposal,
    pub declined: Attendee,
}

/// Exactly one candidate slot plus a short rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAlternative {
    pub proposal: Proposal,
    pub rationale: String,
}

#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait ReasoningOracle: Send + Sync {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, OracleError>;

    async fn find_alternative(
        &self,
        request: &AlternativeRequest,
    ) -> Result<SuggestedAlternative, OracleError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
