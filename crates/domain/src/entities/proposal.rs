//! Meeting proposal produced by the Reasoning Oracle

use super::attendee::Attendee;
use super::AttendeeSet;
use serde::{Deserialize, Serialize};

/// A candidate day/time/duration/location/format for the meeting.
///
/// The active proposal of a session is replaced wholesale whenever the
/// oracle returns a new one; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub day: String,
    pub time: String,
    pub duration: String,
    pub location: String,
    #[serde(default)]
    pub includes_zoom: bool,
    #[serde(default)]
    pub reasoning: String,
    pub critical_count: u32,
    pub total_critical: u32,
    pub non_critical_count: u32,
    pub total_non_critical: u32,
    #[serde(default)]
    pub is_lunch_meeting: bool,
    /// Emails the oracle reported as conflicting with this slot
    #[serde(default)]
    pub unavailable: Vec<String>,
}

impl Proposal {
    /// Only proposals that account for every mandatory attendee may be sent
    pub fn is_invitable(&self) -> bool {
        self.critical_count == self.total_critical
    }

    /// Invitable, and computed for the critical attendees `attendees` has now.
    /// A proposal made before someone became required does not cover them.
    pub fn covers(&self, attendees: &AttendeeSet) -> bool {
        self.is_invitable() && self.total_critical as usize == attendees.critical_count()
    }

    /// Critical attendees this proposal does not account for.
    ///
    /// Uses the oracle's conflict list when it named anyone; otherwise every
    /// critical attendee is reported since the counts alone cannot say who.
    pub fn missing_critical<'a>(&self, attendees: &'a AttendeeSet) -> Vec<&'a Attendee> {
        if self.covers(attendees) {
            return Vec::new();
        }
        let named: Vec<&Attendee> = attendees
            .critical()
            .filter(|a| self.unavailable.iter().any(|email| a.matches(email)))
            .collect();
        if named.is_empty() {
            attendees.critical().collect()
        } else {
            named
        }
    }

    /// "Monday at 2:00 PM"
    pub fn slot_label(&self) -> String {
        format!("{} at {}", self.day, self.time)
    }

    /// Same meeting moved to another slot; availability counts are kept
    pub fn moved_to(&self, day: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            time: time.into(),
            unavailable: Vec::new(),
            ..self.clone()
        }
    }
}

/// Where an alternative candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    Oracle,
    /// Deterministic default used when the oracle failed
    Fallback,
}

/// Alternative slot awaiting the host's accept/reject decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeCandidate {
    pub proposal: Proposal,
    pub rationale: String,
    pub source: CandidateSource,
    /// The mandatory attendee whose decline triggered the search
    pub declined: Attendee,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(critical_count: u32, total_critical: u32) -> Proposal {
        Proposal {
            day: "Monday".into(),
            time: "2:00 PM".into(),
            duration: "1 hour".into(),
            location: "Huntsman Hall".into(),
            includes_zoom: false,
            reasoning: String::new(),
            critical_count,
            total_critical,
            non_critical_count: 1,
            total_non_critical: 1,
            is_lunch_meeting: false,
            unavailable: Vec::new(),
        }
    }

    fn attendees() -> AttendeeSet {
        vec![
            Attendee::new("Gayatri Sriram", "gayatri1@wharton.upenn.edu").critical(),
            Attendee::new("Manan Dadhania", "dadhania@wharton.upenn.edu").critical(),
            Attendee::new("Ash Rk", "ashrk@wharton.upenn.edu"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_invitable_only_when_all_critical_accounted() {
        assert!(proposal(2, 2).is_invitable());
        assert!(!proposal(1, 2).is_invitable());
        assert!(proposal(0, 0).is_invitable());
    }

    #[test]
    fn test_missing_critical_prefers_named_conflicts() {
        let set = attendees();
        let mut p = proposal(1, 2);
        p.unavailable = vec!["DADHANIA@wharton.upenn.edu".into()];
        let missing = p.missing_critical(&set);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "Manan Dadhania");
    }

    #[test]
    fn test_missing_critical_without_names_lists_all_critical() {
        let set = attendees();
        let missing = proposal(1, 2).missing_critical(&set);
        assert_eq!(missing.len(), 2);
        assert!(proposal(2, 2).missing_critical(&set).is_empty());
    }

    #[test]
    fn test_moved_to_keeps_format() {
        let moved = proposal(2, 2).moved_to("Tuesday", "2:00 PM");
        assert_eq!(moved.slot_label(), "Tuesday at 2:00 PM");
        assert_eq!(moved.duration, "1 hour");
        assert_eq!(moved.location, "Huntsman Hall");
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        let json = r#"{"day": "Friday", "time": "10:00 AM", "duration": "30 minutes",
            "location": "Zoom", "critical_count": 1, "total_critical": 1,
            "non_critical_count": 0, "total_non_critical": 2}"#;
        let parsed: Proposal = serde_json::from_str(json).unwrap();
        assert!(!parsed.includes_zoom);
        assert!(!parsed.is_lunch_meeting);
        assert!(parsed.unavailable.is_empty());
        assert!(parsed.is_invitable());
    }

    #[test]
    fn test_covers_requires_current_critical_total() {
        let set = attendees();
        assert!(proposal(2, 2).covers(&set));
        assert!(!proposal(1, 2).covers(&set));
        // computed when only one attendee was required
        let stale = proposal(1, 1);
        assert!(stale.is_invitable());
        assert!(!stale.covers(&set));
        assert_eq!(stale.missing_critical(&set).len(), 2);
    }
}
