//! Negotiation Errors
//!
//! None of these terminate a session. Every variant can be rendered as a
//! conversational message for the host via [`NegotiationError::host_message`].

use std::time::Duration;
use thiserror::Error;

/// Missing or malformed setup input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select at least one attendee")]
    NoAttendees,

    #[error("Please enter your email address")]
    MissingHost,

    #[error("Please enter a calendar event title")]
    MissingTitle,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Attendee already selected: {0}")]
    DuplicateAttendee(String),

    #[error("Message cannot be empty")]
    EmptyTurn,
}

/// Reasoning Oracle failures; recovered locally by the caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Reasoning service unreachable: {0}")]
    Transport(String),

    #[error("Reasoning service returned malformed output: {0}")]
    Malformed(String),

    #[error("Reasoning service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Reasoning service found no candidate slot")]
    NoCandidate,
}

/// Errors surfaced by negotiation operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Response event arrived outside the monitoring state
    #[error("Response from {email} arrived out of order (state: {state})")]
    OutOfOrderEvent { email: String, state: String },

    /// Host reply to the alternative offer was neither accept nor reject
    #[error("Unrecognized decision: {input:?}")]
    InvalidDecisionInput { input: String },

    #[error("{email} is not an attendee of this meeting")]
    UnknownAttendee { email: String },

    #[error("Operation '{operation}' is not allowed in state {state}")]
    InvalidTransition {
        state: String,
        operation: &'static str,
    },

    /// Single-slot guard: another host call is still in flight
    #[error("Another request is still being processed")]
    TurnInFlight,

    #[error("Proposal does not work for every critical attendee (missing: {})", .missing.join(", "))]
    ProposalIneligible { missing: Vec<String> },

    #[error("No meeting proposal is available yet")]
    NoProposal,

    #[error("Invitation delivery was not accepted")]
    InvitationRejected,

    #[error("Attendee criticality can no longer change once invitations are sent")]
    AttendeesLocked,

    /// The background conflict resolution task stopped before storing a candidate
    #[error("Conflict resolution stopped unexpectedly: {0}")]
    ResolutionInterrupted(String),
}

/// Negotiation result type
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Categories of negotiation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Host input errors, reported without a transition
    Validation,
    /// Adapter failures recovered by apology or fallback
    Oracle,
    /// Events or operations that do not fit the current state
    Ordering,
    /// Business rule violations
    BusinessRule,
}

impl NegotiationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NegotiationError::Validation(_)
            | NegotiationError::InvalidDecisionInput { .. }
            | NegotiationError::UnknownAttendee { .. } => ErrorCategory::Validation,
            NegotiationError::Oracle(_) | NegotiationError::ResolutionInterrupted(_) => {
                ErrorCategory::Oracle
            }
            NegotiationError::OutOfOrderEvent { .. }
            | NegotiationError::InvalidTransition { .. }
            | NegotiationError::TurnInFlight => ErrorCategory::Ordering,
            NegotiationError::ProposalIneligible { .. }
            | NegotiationError::NoProposal
            | NegotiationError::InvitationRejected
            | NegotiationError::AttendeesLocked => ErrorCategory::BusinessRule,
        }
    }

    /// Conversational rendering shown to the host instead of a raw error
    pub fn host_message(&self) -> String {
        match self {
            NegotiationError::Validation(e) => e.to_string(),
            NegotiationError::Oracle(_) => {
                "I apologize, I encountered an error. Could you please rephrase your request?"
                    .to_string()
            }
            NegotiationError::OutOfOrderEvent { email, .. } => {
                format!("A response from {} arrived at an unexpected time and was ignored.", email)
            }
            NegotiationError::InvalidDecisionInput { .. } => {
                "Please type \"yes\" to reschedule to the new time, or \"no\" to lock in the original time."
                    .to_string()
            }
            NegotiationError::UnknownAttendee { email } => {
                format!("{} is not on the attendee list for this meeting.", email)
            }
            NegotiationError::InvalidTransition { operation, .. } => {
                format!("That action ({}) isn't available right now.", operation)
            }
            NegotiationError::TurnInFlight => {
                "Still working on your previous message, please wait a moment.".to_string()
            }
            NegotiationError::ProposalIneligible { missing } => format!(
                "This time doesn't work for every critical attendee yet ({}). \
                 Tell me more about your preferences so I can find another slot.",
                missing.join(", ")
            ),
            NegotiationError::NoProposal => {
                "I don't have a meeting proposal yet. Describe your preferences first.".to_string()
            }
            NegotiationError::InvitationRejected => {
                "The invitations could not be sent. Nothing was delivered, please try again."
                    .to_string()
            }
            NegotiationError::AttendeesLocked => {
                "Invitations are already out, so critical attendees can't be changed.".to_string()
            }
            NegotiationError::ResolutionInterrupted(_) => {
                "Something went wrong while looking for a new time. Please check the status and try again."
                    .to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let validation: NegotiationError = ValidationError::MissingTitle.into();
        assert_eq!(validation.category(), ErrorCategory::Validation);

        let oracle: NegotiationError = OracleError::Malformed("not json".into()).into();
        assert_eq!(oracle.category(), ErrorCategory::Oracle);

        let ordering = NegotiationError::OutOfOrderEvent {
            email: "a@x.edu".into(),
            state: "Preview".into(),
        };
        assert_eq!(ordering.category(), ErrorCategory::Ordering);

        let rule = NegotiationError::ProposalIneligible {
            missing: vec!["Ash Rk".into()],
        };
        assert_eq!(rule.category(), ErrorCategory::BusinessRule);
    }

    #[test]
    fn test_oracle_errors_degrade_to_apology() {
        let err: NegotiationError = OracleError::Timeout(Duration::from_secs(30)).into();
        assert!(err.host_message().starts_with("I apologize"));
    }

    #[test]
    fn test_ineligible_message_names_missing_attendees() {
        let err = NegotiationError::ProposalIneligible {
            missing: vec!["Ash Rk".into(), "Manan Dadhania".into()],
        };
        assert!(err.to_string().contains("Ash Rk, Manan Dadhania"));
        assert!(err.host_message().contains("Ash Rk"));
    }
}
