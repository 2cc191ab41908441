//! Attendee entity and the ordered attendee set owned by a session

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Canonical form of an email used for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// A meeting participant, optionally flagged critical (mandatory)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub critical: bool,
}

impl Attendee {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into().trim().to_string(),
            critical: false,
        }
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn matches(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }

    /// First name, used in conversational notices
    pub fn short_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Selected attendees in selection order, keyed by email
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeSet {
    members: Vec<Attendee>,
}

impl AttendeeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attendee: Attendee) -> Result<(), ValidationError> {
        let email = attendee.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::InvalidEmail(attendee.email.clone()));
        }
        if self.contains(email) {
            return Err(ValidationError::DuplicateAttendee(attendee.email.clone()));
        }
        self.members.push(attendee);
        Ok(())
    }

    pub fn remove(&mut self, email: &str) -> Option<Attendee> {
        let idx = self.members.iter().position(|a| a.matches(email))?;
        Some(self.members.remove(idx))
    }

    /// Returns false when no attendee has this email
    pub fn set_critical(&mut self, email: &str, critical: bool) -> bool {
        match self.members.iter_mut().find(|a| a.matches(email)) {
            Some(attendee) => {
                attendee.critical = critical;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, email: &str) -> Option<&Attendee> {
        self.members.iter().find(|a| a.matches(email))
    }

    pub fn contains(&self, email: &str) -> bool {
        self.get(email).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attendee> {
        self.members.iter()
    }

    pub fn critical(&self) -> impl Iterator<Item = &Attendee> {
        self.members.iter().filter(|a| a.critical)
    }

    pub fn non_critical(&self) -> impl Iterator<Item = &Attendee> {
        self.members.iter().filter(|a| !a.critical)
    }

    pub fn critical_count(&self) -> usize {
        self.critical().count()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// "Gayatri Sriram, Manan Dadhania"
    pub fn display_names(&self) -> String {
        self.members
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn to_vec(&self) -> Vec<Attendee> {
        self.members.clone()
    }
}

impl FromIterator<Attendee> for AttendeeSet {
    fn from_iter<I: IntoIterator<Item = Attendee>>(iter: I) -> Self {
        let mut set = AttendeeSet::new();
        for attendee in iter {
            // duplicates and malformed entries are skipped
            let _ = set.add(attendee);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttendeeSet {
        let mut set = AttendeeSet::new();
        set.add(Attendee::new("Gayatri Sriram", "gayatri1@wharton.upenn.edu"))
            .unwrap();
        set.add(Attendee::new("Ash Rk", "ashrk@wharton.upenn.edu").critical())
            .unwrap();
        set
    }

    #[test]
    fn test_emails_are_unique_case_insensitively() {
        let mut set = sample();
        let err = set
            .add(Attendee::new("Ash Again", "ASHRK@wharton.upenn.edu"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateAttendee(_)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_rejects_malformed_email() {
        let mut set = AttendeeSet::new();
        assert!(matches!(
            set.add(Attendee::new("Nobody", "not-an-email")),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(set.is_empty());
    }

    #[test]
    fn test_criticality_toggle_and_partitions() {
        let mut set = sample();
        assert_eq!(set.critical_count(), 1);
        assert!(set.set_critical("gayatri1@wharton.upenn.edu", true));
        assert_eq!(set.critical_count(), 2);
        assert_eq!(set.non_critical().count(), 0);
        assert!(!set.set_critical("missing@wharton.upenn.edu", true));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut set = sample();
        set.add(Attendee::new("Manan Dadhania", "dadhania@wharton.upenn.edu"))
            .unwrap();
        let removed = set.remove("ashrk@wharton.upenn.edu").unwrap();
        assert_eq!(removed.name, "Ash Rk");
        assert_eq!(set.display_names(), "Gayatri Sriram, Manan Dadhania");
    }

    #[test]
    fn test_short_name() {
        assert_eq!(Attendee::new("Manan Dadhania", "d@x.edu").short_name(), "Manan");
    }
}
