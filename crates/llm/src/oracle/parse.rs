//! Decoding model output into domain values

use domain::{AttendeeAvailability, Interpretation, OracleError, Proposal, SuggestedAlternative};
use serde::Deserialize;

/// Remove markdown code fences the model sometimes wraps around JSON
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string ("json") on the opening fence line
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Attendee totals used when the model leaves the counts out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headcount {
    pub critical: u32,
    pub non_critical: u32,
}

impl Headcount {
    pub fn of(attendees: &[AttendeeAvailability]) -> Self {
        let critical = attendees.iter().filter(|a| a.attendee.critical).count() as u32;
        Self {
            critical,
            non_critical: attendees.len() as u32 - critical,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterpretDto {
    #[serde(default)]
    needs_more_info: bool,
    response: String,
    #[serde(default)]
    lunch_recommendations: Option<Vec<String>>,
    #[serde(default)]
    proposed_meeting: Option<MeetingDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeetingDto {
    day: String,
    time: String,
    duration: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    includes_zoom: bool,
    #[serde(default)]
    is_lunch_meeting: bool,
    #[serde(default)]
    works_for_all_critical: Option<bool>,
    critical_count: Option<u32>,
    total_critical: Option<u32>,
    non_critical_count: Option<u32>,
    total_non_critical: Option<u32>,
    #[serde(default)]
    unavailable: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

impl MeetingDto {
    fn into_proposal(self, headcount: Headcount) -> Proposal {
        let total_critical = self.total_critical.unwrap_or(headcount.critical);
        let total_non_critical = self.total_non_critical.unwrap_or(headcount.non_critical);
        let critical_count = match (self.critical_count, self.works_for_all_critical) {
            (Some(count), _) => count,
            (None, Some(false)) => total_critical.saturating_sub(1),
            (None, _) => total_critical,
        };
        Proposal {
            day: self.day,
            time: self.time,
            duration: self.duration,
            location: self.location.unwrap_or_default(),
            includes_zoom: self.includes_zoom,
            reasoning: self.reasoning,
            critical_count,
            total_critical,
            non_critical_count: self.non_critical_count.unwrap_or(total_non_critical),
            total_non_critical,
            is_lunch_meeting: self.is_lunch_meeting,
            unavailable: self.unavailable,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlternativeDto {
    alternative_time: AlternativeTimeDto,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlternativeTimeDto {
    day: String,
    time: String,
    duration: Option<String>,
    location: Option<String>,
    includes_zoom: Option<bool>,
}

fn malformed(err: serde_json::Error) -> OracleError {
    OracleError::Malformed(err.to_string())
}

pub fn parse_interpretation(raw: &str, headcount: Headcount) -> Result<Interpretation, OracleError> {
    let dto: InterpretDto = serde_json::from_str(strip_code_fences(raw)).map_err(malformed)?;
    let proposal = dto.proposed_meeting.map(|m| m.into_proposal(headcount));
    if proposal.is_none() && dto.response.trim().is_empty() {
        return Err(OracleError::Malformed(
            "neither a proposal nor a question was returned".to_string(),
        ));
    }
    Ok(Interpretation {
        needs_more_info: dto.needs_more_info || proposal.is_none(),
        response_text: dto.response,
        proposal,
        lunch_recommendations: dto.lunch_recommendations.unwrap_or_default(),
    })
}

/// The alternative inherits everything the model did not restate from the
/// current proposal and is assumed to work for everyone.
pub fn parse_alternative(
    raw: &str,
    current: &Proposal,
    headcount: Headcount,
) -> Result<SuggestedAlternative, OracleError> {
    let dto: AlternativeDto = serde_json::from_str(strip_code_fences(raw)).map_err(malformed)?;
    let slot = dto.alternative_time;
    if slot.day.trim().is_empty() || slot.time.trim().is_empty() {
        return Err(OracleError::Malformed("alternative has no day or time".to_string()));
    }

    let proposal = Proposal {
        day: slot.day,
        time: slot.time,
        duration: slot.duration.unwrap_or_else(|| current.duration.clone()),
        location: slot.location.unwrap_or_else(|| current.location.clone()),
        includes_zoom: slot.includes_zoom.unwrap_or(current.includes_zoom),
        reasoning: dto.reasoning.clone(),
        critical_count: headcount.critical,
        total_critical: headcount.critical,
        non_critical_count: headcount.non_critical,
        total_non_critical: headcount.non_critical,
        is_lunch_meeting: current.is_lunch_meeting,
        unavailable: Vec::new(),
    };
    Ok(SuggestedAlternative {
        proposal,
        rationale: dto.reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADCOUNT: Headcount = Headcount {
        critical: 1,
        non_critical: 2,
    };

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_clarifying_question() {
        let raw = r#"{"needsMoreInfo": true, "response": "How long?", "proposedMeeting": null}"#;
        let parsed = parse_interpretation(raw, HEADCOUNT).unwrap();
        assert!(parsed.needs_more_info);
        assert!(parsed.proposal.is_none());
        assert_eq!(parsed.response_text, "How long?");
    }

    #[test]
    fn test_parse_proposal_with_lunch_spots() {
        let raw = r#"```json
{
  "needsMoreInfo": false,
  "response": "How about Tuesday at noon?",
  "lunchRecommendations": ["Houston Market", "Pret"],
  "proposedMeeting": {
    "day": "Tuesday", "time": "12:00 PM", "duration": "1 hour",
    "location": "TBD", "includesZoom": false, "isLunchMeeting": true,
    "worksForAllCritical": true,
    "criticalCount": 1, "totalCritical": 1,
    "nonCriticalCount": 1, "totalNonCritical": 2,
    "reasoning": "Only Manan is busy"
  }
}
```"#;
        let parsed = parse_interpretation(raw, HEADCOUNT).unwrap();
        let proposal = parsed.proposal.unwrap();
        assert!(proposal.is_invitable());
        assert!(proposal.is_lunch_meeting);
        assert_eq!(proposal.non_critical_count, 1);
        assert_eq!(parsed.lunch_recommendations.len(), 2);
    }

    #[test]
    fn test_missing_counts_fall_back_to_headcount() {
        let raw = r#"{"response": "ok", "proposedMeeting": {
            "day": "Monday", "time": "3:00 PM", "duration": "30 minutes",
            "worksForAllCritical": false }}"#;
        let proposal = parse_interpretation(raw, HEADCOUNT).unwrap().proposal.unwrap();
        assert_eq!(proposal.total_critical, 1);
        assert_eq!(proposal.critical_count, 0);
        assert!(!proposal.is_invitable());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_interpretation("Sure! Monday works.", HEADCOUNT).unwrap_err();
        assert!(matches!(err, OracleError::Malformed(_)));
    }

    #[test]
    fn test_parse_alternative_inherits_format() {
        let current = Proposal {
            day: "Monday".into(),
            time: "2:00 PM".into(),
            duration: "1 hour".into(),
            location: "Huntsman Hall".into(),
            includes_zoom: true,
            reasoning: String::new(),
            critical_count: 1,
            total_critical: 1,
            non_critical_count: 2,
            total_non_critical: 2,
            is_lunch_meeting: false,
            unavailable: Vec::new(),
        };
        let raw = r#"{"alternativeTime": {"day": "Wednesday", "time": "2:00 PM"},
                      "reasoning": "Everyone is free Wednesday afternoon"}"#;
        let alt = parse_alternative(raw, &current, HEADCOUNT).unwrap();
        assert_eq!(alt.proposal.slot_label(), "Wednesday at 2:00 PM");
        assert_eq!(alt.proposal.location, "Huntsman Hall");
        assert!(alt.proposal.includes_zoom);
        assert!(alt.proposal.is_invitable());
        assert_eq!(alt.rationale, "Everyone is free Wednesday afternoon");
    }
}
