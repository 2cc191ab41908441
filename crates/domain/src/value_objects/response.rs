//! Per-attendee RSVP state for one invitation round

use crate::entities::{normalize_email, AttendeeSet};
use crate::RoundNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Accepted,
    Declined,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Accepted => "accepted",
            ResponseStatus::Declined => "declined",
        };
        f.write_str(label)
    }
}

/// What an external response event carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Declined,
}

impl From<Decision> for ResponseStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => ResponseStatus::Accepted,
            Decision::Declined => ResponseStatus::Declined,
        }
    }
}

/// Result of applying one event to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Applied(ResponseStatus),
    /// Attendee already decided this round; map unchanged
    AlreadyDecided(ResponseStatus),
    UnknownAttendee,
}

/// Response map keyed by normalized email.
///
/// Every entry moves out of `Pending` at most once per round. The map also
/// remembers which mandatory decline (if any) claimed this round's conflict
/// resolution so it can never be claimed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMap {
    round: RoundNumber,
    entries: BTreeMap<String, ResponseStatus>,
    conflict_claimed_by: Option<String>,
}

impl ResponseMap {
    /// Fresh round with every attendee pending
    pub fn new_round(attendees: &AttendeeSet, round: RoundNumber) -> Self {
        Self {
            round,
            entries: attendees
                .iter()
                .map(|a| (normalize_email(&a.email), ResponseStatus::Pending))
                .collect(),
            conflict_claimed_by: None,
        }
    }

    pub fn round(&self) -> RoundNumber {
        self.round
    }

    pub fn status(&self, email: &str) -> Option<ResponseStatus> {
        self.entries.get(&normalize_email(email)).copied()
    }

    pub fn record(&mut self, email: &str, decision: Decision) -> RecordOutcome {
        match self.entries.get_mut(&normalize_email(email)) {
            None => RecordOutcome::UnknownAttendee,
            Some(current) if *current != ResponseStatus::Pending => {
                RecordOutcome::AlreadyDecided(*current)
            }
            Some(current) => {
                *current = decision.into();
                RecordOutcome::Applied(*current)
            }
        }
    }

    /// Pin an attendee to `Declined`; used when the host locks in without them
    pub fn mark_declined(&mut self, email: &str) {
        if let Some(current) = self.entries.get_mut(&normalize_email(email)) {
            *current = ResponseStatus::Declined;
        }
    }

    pub fn all_responded(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .values()
                .all(|s| *s != ResponseStatus::Pending)
    }

    pub fn count(&self, status: ResponseStatus) -> usize {
        self.entries.values().filter(|s| **s == status).count()
    }

    /// First claim wins; later callers in the same round get false
    pub fn claim_conflict(&mut self, email: &str) -> bool {
        if self.conflict_claimed_by.is_some() {
            return false;
        }
        self.conflict_claimed_by = Some(normalize_email(email));
        true
    }

    pub fn conflict_claimed_by(&self) -> Option<&str> {
        self.conflict_claimed_by.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ResponseStatus)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
