//! Value Objects - immutable data carried through a negotiation

pub mod busy_interval;
pub mod host_decision;
pub mod response;

pub use busy_interval::{parse_clock, BusyInterval};
pub use host_decision::HostDecision;
pub use response::{Decision, RecordOutcome, ResponseMap, ResponseStatus};
