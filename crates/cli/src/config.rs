//! Application configuration (`optimeet.toml`)

use anyhow::{Context, Result};
use common::LoggingConfig;
use domain::BusyInterval;
use orchestrator::NegotiatorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = "optimeet.toml";

/// One person in the static directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub busy: Vec<BusyInterval>,
}

impl RosterEntry {
    fn new(name: &str, email: &str, busy: Vec<BusyInterval>) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            busy,
        }
    }
}

/// Scripted attendee responses for demos
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub enabled: bool,
    /// Pause before each simulated response
    pub response_delay_ms: u64,
    /// Declines the first invitation round; everyone else accepts
    pub decliner: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            response_delay_ms: 800,
            decliner: Some("ashrk@wharton.upenn.edu".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub negotiation: NegotiatorConfig,
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
    pub roster: Vec<RosterEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            negotiation: NegotiatorConfig::default(),
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
            roster: default_roster(),
        }
    }
}

pub fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new(
            "Gayatri Sriram",
            "gayatri1@wharton.upenn.edu",
            vec![
                BusyInterval::new("Monday", "9:00 AM", "10:30 AM"),
                BusyInterval::new("Tuesday", "11:00 AM", "12:30 PM"),
            ],
        ),
        RosterEntry::new(
            "Manan Dadhania",
            "dadhania@wharton.upenn.edu",
            vec![
                BusyInterval::new("Monday", "10:00 AM", "11:30 AM"),
                BusyInterval::new("Tuesday", "2:00 PM", "4:00 PM"),
            ],
        ),
        RosterEntry::new(
            "Ash Rk",
            "ashrk@wharton.upenn.edu",
            vec![
                BusyInterval::new("Monday", "1:00 PM", "2:30 PM"),
                BusyInterval::new("Wednesday", "10:00 AM", "11:30 AM"),
            ],
        ),
    ]
}

impl AppConfig {
    /// Explicit path, else `./optimeet.toml`, else the user config dir, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in Self::search_paths() {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("optimeet").join("config.toml"));
        }
        paths
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
