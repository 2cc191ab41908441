//! In-memory directory built from the configured roster

use crate::config::RosterEntry;
use async_trait::async_trait;
use domain::{normalize_email, BusyInterval, DirectoryAdapter, DirectoryEntry};

#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: Vec<RosterEntry>,
}

impl StaticDirectory {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn find(&self, email: &str) -> Option<&RosterEntry> {
        let email = normalize_email(email);
        self.entries
            .iter()
            .find(|e| normalize_email(&e.email) == email)
    }
}

#[async_trait]
impl DirectoryAdapter for StaticDirectory {
    async fn lookup_busy_intervals(&self, email: &str) -> Vec<BusyInterval> {
        self.find(email).map(|e| e.busy.clone()).unwrap_or_default()
    }

    async fn search(&self, term: &str) -> Vec<DirectoryEntry> {
        let term = term.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                term.is_empty()
                    || e.name.to_lowercase().contains(&term)
                    || e.email.to_lowercase().contains(&term)
            })
            .map(|e| DirectoryEntry {
                name: e.name.clone(),
                email: e.email.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_roster;

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let directory = StaticDirectory::new(default_roster());
        let busy = directory
            .lookup_busy_intervals("AshRk@Wharton.upenn.edu")
            .await;
        assert_eq!(busy.len(), 2);
        assert!(directory
            .lookup_busy_intervals("nobody@example.com")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_name_or_email() {
        let directory = StaticDirectory::new(default_roster());
        assert_eq!(directory.search("").await.len(), 3);
        assert_eq!(directory.search("manan").await[0].email, "dadhania@wharton.upenn.edu");
        assert_eq!(directory.search("GAYATRI1@").await.len(), 1);
        assert!(directory.search("zzz").await.is_empty());
    }
}
