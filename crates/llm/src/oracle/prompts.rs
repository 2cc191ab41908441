//! Prompt construction for the LLM-backed oracle

use domain::{AlternativeRequest, AttendeeAvailability, InterpretRequest, TurnRole};
use serde::Serialize;

pub const SYSTEM_PROMPT: &str = "You are a scheduling assistant that helps a host agree on a \
single meeting time with a group of attendees. You only ever answer with one JSON object and \
no other text.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalendarEntry<'a> {
    name: &'a str,
    email: &'a str,
    critical: bool,
    busy_times: Vec<BusyTime<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BusyTime<'a> {
    day: &'a str,
    start_time: &'a str,
    end_time: &'a str,
}

fn calendar_json(attendees: &[AttendeeAvailability]) -> String {
    let entries: Vec<CalendarEntry<'_>> = attendees
        .iter()
        .map(|a| CalendarEntry {
            name: &a.attendee.name,
            email: &a.attendee.email,
            critical: a.attendee.critical,
            busy_times: a
                .busy
                .iter()
                .map(|b| BusyTime {
                    day: &b.day,
                    start_time: &b.start_time,
                    end_time: &b.end_time,
                })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
}

fn names(attendees: &[AttendeeAvailability], critical: bool) -> String {
    let list: Vec<&str> = attendees
        .iter()
        .filter(|a| a.attendee.critical == critical)
        .map(|a| a.attendee.name.as_str())
        .collect();
    if list.is_empty() {
        "None".to_string()
    } else {
        list.join(", ")
    }
}

pub fn interpret_prompt(request: &InterpretRequest) -> String {
    let conversation = request
        .transcript
        .iter()
        .filter(|t| t.role != TurnRole::System)
        .map(|t| {
            let speaker = if t.role == TurnRole::Host { "User" } else { "Assistant" };
            format!("{}: {}", speaker, t.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are scheduling "{title}".

ATTENDEES AND CALENDAR AVAILABILITY:
{calendar}

Critical attendees: {critical}
Non-critical attendees: {non_critical}

CONVERSATION SO FAR:
{conversation}

USER'S LATEST REQUEST:
{turn}

Your tasks:
1. Parse the user's scheduling preferences (time range, duration, Zoom/location needs)
2. If they mention lunch but no location, suggest 2-3 lunch spots nearby
3. Check calendar availability
4. Find the time that works for every critical attendee and as many non-critical attendees as possible
5. Ask a clarifying question if anything essential is missing

Respond in EXACT JSON format:
{{
  "needsMoreInfo": true/false,
  "response": "Conversational response to the user",
  "lunchRecommendations": null or ["spot", "spot"],
  "proposedMeeting": {{
    "day": "Monday",
    "time": "12:00 PM",
    "duration": "1 hour",
    "location": "Location or TBD",
    "includesZoom": true/false,
    "isLunchMeeting": false,
    "criticalCount": 2,
    "totalCritical": 2,
    "nonCriticalCount": 1,
    "totalNonCritical": 1,
    "unavailable": ["email of anyone busy at that time"],
    "reasoning": "Brief explanation"
  }}
}}

If there is not enough information yet, set proposedMeeting to null. If you propose a time, ask whether to send the invites."#,
        title = request.title,
        calendar = calendar_json(&request.attendees),
        critical = names(&request.attendees, true),
        non_critical = names(&request.attendees, false),
        conversation = if conversation.is_empty() { "(none)".to_string() } else { conversation },
        turn = request.user_turn,
    )
}

pub fn alternative_prompt(request: &AlternativeRequest) -> String {
    let current = &request.current;
    format!(
        r#"{declined} ({email}) has declined "{title}" and is a critical attendee.

CURRENT MEETING:
- Time: {day} at {time}
- Duration: {duration}

ATTENDEES CALENDAR AVAILABILITY:
{calendar}

Find ONE alternative time, different from the current one, that works for every attendee including {declined}.

Respond ONLY with valid JSON in this exact format (no other text):
{{
  "alternativeTime": {{
    "day": "Wednesday",
    "time": "2:00 PM",
    "duration": "{duration}",
    "location": "{location}",
    "includesZoom": {zoom}
  }},
  "reasoning": "Brief explanation of why this time works"
}}"#,
        declined = request.declined.name,
        email = request.declined.email,
        title = request.title,
        day = current.day,
        time = current.time,
        duration = current.duration,
        location = current.location,
        zoom = current.includes_zoom,
        calendar = calendar_json(&request.attendees),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Attendee, BusyInterval, Turn};

    fn attendees() -> Vec<AttendeeAvailability> {
        vec![
            AttendeeAvailability {
                attendee: Attendee::new("Ash Rk", "ashrk@wharton.upenn.edu").critical(),
                busy: vec![BusyInterval::new("Monday", "1:00 PM", "2:30 PM")],
            },
            AttendeeAvailability {
                attendee: Attendee::new("Manan Dadhania", "dadhania@wharton.upenn.edu"),
                busy: vec![],
            },
        ]
    }

    #[test]
    fn test_interpret_prompt_excludes_system_turns() {
        let request = InterpretRequest {
            title: "Team Sync".into(),
            attendees: attendees(),
            transcript: vec![
                Turn::assistant("Hi! Tell me your preferences."),
                Turn::system("INVITATIONS SENT"),
            ],
            user_turn: "Monday afternoon for an hour".into(),
        };
        let prompt = interpret_prompt(&request);
        assert!(prompt.contains("\"busyTimes\""));
        assert!(prompt.contains("Critical attendees: Ash Rk"));
        assert!(prompt.contains("Non-critical attendees: Manan Dadhania"));
        assert!(prompt.contains("Assistant: Hi!"));
        assert!(!prompt.contains("INVITATIONS SENT"));
        assert!(prompt.ends_with("whether to send the invites."));
    }
}
