//! Negotiation session state

use crate::events::NegotiationEvent;
use domain::{
    normalize_email, AlternativeCandidate, Attendee, AttendeeAvailability, AttendeeSet,
    BusyInterval, Proposal, ResponseMap, Transcript, Turn, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a session reached its terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Every attendee answered and no mandatory attendee declined
    AsProposed,
    /// The host kept the original time despite `declined` being unable to attend
    LockedIn { declined: Attendee },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationState {
    Setup,
    Dialogue,
    Preview,
    /// Invitations are out and responses are being collected
    Monitoring,
    AlternativeProposed,
    Resolved(Resolution),
    Abandoned,
}

impl NegotiationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Abandoned)
    }

    /// Attendee criticality may still change before invitations go out
    pub fn allows_criticality_edit(&self) -> bool {
        matches!(self, Self::Setup | Self::Dialogue | Self::Preview)
    }

    pub fn accepts_turns(&self) -> bool {
        matches!(self, Self::Dialogue | Self::Preview)
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Setup => "SETUP",
            Self::Dialogue => "DIALOGUE",
            Self::Preview => "PREVIEW",
            Self::Monitoring => "INVITED/MONITORING",
            Self::AlternativeProposed => "ALTERNATIVE_PROPOSED",
            Self::Resolved(_) => "RESOLVED",
            Self::Abandoned => "ABANDONED",
        };
        f.write_str(label)
    }
}

/// One meeting-scheduling attempt for one host and one title.
///
/// All mutation goes through the owning `Negotiator`; the helpers here
/// record the matching [`NegotiationEvent`] for every change so the caller
/// can publish them once the session lock is released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationSession {
    pub id: Uuid,
    pub title: String,
    pub host: String,
    pub attendees: AttendeeSet,
    pub state: NegotiationState,
    pub transcript: Transcript,
    pub proposal: Option<Proposal>,
    pub responses: ResponseMap,
    pub alternative: Option<AlternativeCandidate>,
}

impl Default for NegotiationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NegotiationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            host: String::new(),
            attendees: AttendeeSet::new(),
            state: NegotiationState::Setup,
            transcript: Transcript::new(),
            proposal: None,
            responses: ResponseMap::default(),
            alternative: None,
        }
    }

    /// Checks run before leaving SETUP
    pub fn validate_setup(&self) -> Result<(), ValidationError> {
        if self.attendees.is_empty() {
            return Err(ValidationError::NoAttendees);
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingHost);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }

    pub fn set_host(&mut self, email: &str) -> Result<(), ValidationError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ValidationError::MissingHost);
        }
        if !email.contains('@') {
            return Err(ValidationError::InvalidEmail(email));
        }
        self.host = email;
        Ok(())
    }

    pub fn round(&self) -> u32 {
        self.responses.round()
    }

    pub fn push_turn(&mut self, turn: Turn, events: &mut Vec<NegotiationEvent>) {
        self.transcript.push(turn.clone());
        events.push(NegotiationEvent::TurnAppended {
            session_id: self.id,
            turn,
        });
    }

    pub fn transition(&mut self, to: NegotiationState, events: &mut Vec<NegotiationEvent>) {
        if self.state == to {
            return;
        }
        let from = std::mem::replace(&mut self.state, to.clone());
        events.push(NegotiationEvent::StateChanged {
            session_id: self.id,
            from,
            to,
        });
    }

}

/// Owned inputs for an oracle call, taken under the session lock and used after it is released
#[derive(Debug, Clone)]
pub struct OracleContext {
    pub title: String,
    pub attendees: Vec<Attendee>,
}

impl OracleContext {
    pub fn of(session: &NegotiationSession) -> Self {
        Self {
            title: session.title.clone(),
            attendees: session.attendees.to_vec(),
        }
    }

    /// Pair each attendee with the intervals fetched for it, in roster order
    pub fn with_busy(&self, busy: Vec<Vec<BusyInterval>>) -> Vec<AttendeeAvailability> {
        self.attendees
            .iter()
            .cloned()
            .zip(busy)
            .map(|(attendee, busy)| AttendeeAvailability { attendee, busy })
            .collect()
    }
}
