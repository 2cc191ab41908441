//! Domain Layer - OptiMeet negotiation model
//!
//! Contains ONLY the negotiation data model and its rules, without dependencies on:
//! - Infrastructure (HTTP clients, calendars, mail delivery)
//! - Frameworks (CLI, async runtimes)
//! - External systems (reasoning backends, directories)
//!
//! Layout:
//! - Entities: attendees, proposals, transcript turns
//! - Value Objects: busy intervals, RSVP responses, host decisions
//! - Ports: contracts for the Directory, Reasoning Oracle and Invitation Sink adapters
//! - Errors: the negotiation error taxonomy

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

// Re-export core domain types
pub use entities::{
    normalize_email, AlternativeCandidate, Attendee, AttendeeSet, CandidateSource, Proposal,
    Transcript, Turn, TurnRole,
};
pub use errors::{ErrorCategory, NegotiationError, NegotiationResult, OracleError, ValidationError};
pub use ports::{
    AlternativeRequest, AttendeeAvailability, DirectoryAdapter, DirectoryEntry, InterpretRequest,
    Interpretation, Invitation, InvitationSink, ReasoningOracle, SuggestedAlternative,
};
pub use value_objects::{
    parse_clock, BusyInterval, Decision, HostDecision, RecordOutcome, ResponseMap, ResponseStatus,
};

#[cfg(feature = "mocks")]
pub use ports::{MockDirectoryAdapter, MockInvitationSink, MockReasoningOracle};

/// Email address used as the attendee key
pub type AttendeeEmail = String;

/// Invitation round counter, starting at 1 for the first send
pub type RoundNumber = u32;
