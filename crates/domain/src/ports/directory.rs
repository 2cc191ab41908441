//! DirectoryAdapter - source of attendees and their busy intervals

use crate::value_objects::BusyInterval;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A person the host can invite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub email: String,
}

/// Lookup service for attendees.
///
/// Neither operation can fail the negotiation: unknown people simply have
/// no busy intervals and unmatched searches return nothing.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait DirectoryAdapter: Send + Sync {
    /// Busy intervals for an attendee; empty when the email is unknown
    async fn lookup_busy_intervals(&self, email: &str) -> Vec<BusyInterval>;

    /// Case-insensitive match on name or email; an empty term lists everyone
    async fn search(&self, term: &str) -> Vec<DirectoryEntry>;
}
