//! Negotiator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[negotiation]` section of the application config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiatorConfig {
    /// Upper bound on a single Reasoning Oracle call
    pub oracle_timeout_secs: u64,
    /// Location for the fallback alternative when the original has none
    pub default_location: String,
    /// Capacity of each event bus channel
    pub event_buffer: usize,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            oracle_timeout_secs: 30,
            default_location: "Huntsman Hall".to_string(),
            event_buffer: 256,
        }
    }
}

impl NegotiatorConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs.max(1))
    }
}
