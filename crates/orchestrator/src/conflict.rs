//! Conflict resolution after a mandatory attendee declines

use crate::reliability::with_oracle_timeout;
use chrono::{NaiveDate, Weekday};
use domain::{
    AlternativeCandidate, AlternativeRequest, Attendee, CandidateSource, Proposal,
    ReasoningOracle,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const FALLBACK_RATIONALE: &str =
    "The scheduling assistant could not suggest a time, so this moves the meeting to the day after the original at the same time.";

/// Produces exactly one [`AlternativeCandidate`] per invocation.
///
/// Oracle failures of any kind (timeouts included) are absorbed here and
/// answered with [`fallback_candidate`].
pub struct ConflictResolutionEngine {
    oracle: Arc<dyn ReasoningOracle>,
    timeout: Duration,
    default_location: String,
}

impl ConflictResolutionEngine {
    pub fn new(
        oracle: Arc<dyn ReasoningOracle>,
        timeout: Duration,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            oracle,
            timeout,
            default_location: default_location.into(),
        }
    }

    pub async fn resolve(&self, request: &AlternativeRequest) -> AlternativeCandidate {
        let suggestion = with_oracle_timeout(
            "find_alternative",
            self.timeout,
            self.oracle.find_alternative(request),
        )
        .await;

        match suggestion {
            Ok(suggestion) if !covers_critical(&suggestion.proposal, request) => {
                warn!(
                    oracle = self.oracle.name(),
                    slot = %suggestion.proposal.slot_label(),
                    critical = suggestion.proposal.critical_count,
                    total_critical = suggestion.proposal.total_critical,
                    "Oracle alternative misses a critical attendee, using the next-day fallback"
                );
                fallback_candidate(&request.current, &request.declined, &self.default_location)
            }
            Ok(suggestion) => {
                info!(
                    oracle = self.oracle.name(),
                    slot = %suggestion.proposal.slot_label(),
                    declined = %request.declined.email,
                    "Alternative found"
                );
                AlternativeCandidate {
                    proposal: suggestion.proposal,
                    rationale: suggestion.rationale,
                    source: CandidateSource::Oracle,
                    declined: request.declined.clone(),
                }
            }
            Err(e) => {
                warn!(
                    oracle = self.oracle.name(),
                    error = %e,
                    "No alternative from oracle, using the next-day fallback"
                );
                fallback_candidate(&request.current, &request.declined, &self.default_location)
            }
        }
    }
}

/// An alternative is only offered if it could be sent as-is
fn covers_critical(proposal: &Proposal, request: &AlternativeRequest) -> bool {
    let required = request
        .attendees
        .iter()
        .filter(|a| a.attendee.critical)
        .count();
    proposal.is_invitable() && proposal.total_critical as usize == required
}

/// Same time on the following day, assumed to suit every mandatory attendee
pub fn fallback_candidate(
    current: &Proposal,
    declined: &Attendee,
    default_location: &str,
) -> AlternativeCandidate {
    let location = if current.location.trim().is_empty() {
        default_location.to_string()
    } else {
        current.location.clone()
    };
    let proposal = Proposal {
        location,
        reasoning: FALLBACK_RATIONALE.to_string(),
        critical_count: current.total_critical,
        unavailable: Vec::new(),
        ..current.moved_to(next_day(&current.day), current.time.clone())
    };
    AlternativeCandidate {
        proposal,
        rationale: FALLBACK_RATIONALE.to_string(),
        source: CandidateSource::Fallback,
        declined: declined.clone(),
    }
}

/// Weekday names roll over to the next weekday name and ISO dates to the
/// next date; anything else is described relative to the original.
pub fn next_day(day: &str) -> String {
    let day = day.trim();
    if let Ok(weekday) = day.parse::<Weekday>() {
        return weekday_name(weekday.succ()).to_string();
    }
    if let Some(next) = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.succ_opt())
    {
        return next.format("%Y-%m-%d").to_string();
    }
    format!("the day after {}", day)
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
