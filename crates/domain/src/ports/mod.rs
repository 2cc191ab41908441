//! Ports - contracts for the adapters around a negotiation
//!
//! The domain defines the interfaces, outer crates provide the implementations.
//! With the `mocks` feature every port also gets a mockall double.

pub mod directory;
pub mod invitation;
pub mod oracle;

pub use directory::{DirectoryAdapter, DirectoryEntry};
pub use invitation::{Invitation, InvitationSink};
pub use oracle::{
    AlternativeRequest, AttendeeAvailability, InterpretRequest, Interpretation, ReasoningOracle,
    SuggestedAlternative,
};

#[cfg(feature = "mocks")]
pub use directory::MockDirectoryAdapter;
#[cfg(feature = "mocks")]
pub use invitation::MockInvitationSink;
#[cfg(feature = "mocks")]
pub use oracle::MockReasoningOracle;
