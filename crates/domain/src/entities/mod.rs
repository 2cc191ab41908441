//! Domain Entities

pub mod attendee;
pub mod proposal;
pub mod transcript;

pub use attendee::{normalize_email, Attendee, AttendeeSet};
pub use proposal::{AlternativeCandidate, CandidateSource, Proposal};
pub use transcript::{Transcript, Turn, TurnRole};
