//! Offline oracle: keyword preferences plus an hourly slot scan

use async_trait::async_trait;
use domain::{
    parse_clock, AlternativeRequest, Attendee, AttendeeAvailability, InterpretRequest,
    Interpretation, OracleError, Proposal, ReasoningOracle, SuggestedAlternative, TurnRole,
};
use tracing::debug;

const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];
const DAY_START: u32 = 9 * 60;
const DAY_END: u32 = 17 * 60;
const LUNCH_WINDOW: (u32, u32) = (11 * 60, 14 * 60);

const DEFAULT_LUNCH_SPOTS: [&str; 3] = [
    "Huntsman Hall café",
    "Houston Market",
    "the Walnut Street food trucks",
];

/// What the host has asked for so far; later turns override earlier ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Preferences {
    duration: Option<u32>,
    days: Option<Vec<&'static str>>,
    window: Option<(u32, u32)>,
    zoom: bool,
    in_person: bool,
    lunch: bool,
    location: Option<String>,
}

impl Preferences {
    fn parse(text: &str) -> Self {
        let lower = text.to_lowercase();
        let in_person = lower.contains("in person") || lower.contains("in-person");
        let spaced = lower.replace("in-person", "in person").replace('-', " - ");
        let tokens: Vec<&str> = spaced
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '!' | '?' | '(' | ')'))
            .map(|t| t.trim_end_matches('.'))
            .filter(|t| !t.is_empty())
            .collect();

        let lunch = tokens.iter().any(|t| t.starts_with("lunch"));
        Self {
            duration: parse_duration(&tokens),
            days: parse_days(&tokens),
            window: parse_window(&tokens, lunch),
            zoom: tokens
                .iter()
                .any(|t| matches!(*t, "zoom" | "virtual" | "online" | "remote" | "video")),
            in_person,
            lunch,
            location: parse_location(text),
        }
    }

    fn merge(self, later: Preferences) -> Self {
        Self {
            duration: later.duration.or(self.duration),
            days: later.days.or(self.days),
            window: later.window.or(self.window),
            zoom: self.zoom || later.zoom,
            in_person: self.in_person || later.in_person,
            lunch: self.lunch || later.lunch,
            location: later.location.or(self.location),
        }
    }
}

fn number_word(token: &str) -> Option<f32> {
    match token {
        "a" | "an" | "one" => Some(1.0),
        "two" => Some(2.0),
        "three" => Some(3.0),
        "half" => Some(0.5),
        _ => token.parse::<f32>().ok(),
    }
}

fn unit_minutes(token: &str) -> Option<f32> {
    if token.starts_with("min") {
        Some(1.0)
    } else if token.starts_with("hour") || token.starts_with("hr") || token == "h" {
        Some(60.0)
    } else {
        None
    }
}

/// "30 min", "1 hour", "90 minutes", "1.5 hours", "45min", "half an hour"
fn parse_duration(tokens: &[&str]) -> Option<u32> {
    let mut found = None;
    for (i, token) in tokens.iter().enumerate() {
        // "45min" / "2hrs"
        let split = token.find(|c: char| c.is_ascii_alphabetic()).filter(|&at| at > 0);
        if let Some(at) = split {
            let (num, unit) = token.split_at(at);
            if let (Ok(n), Some(unit)) = (num.parse::<f32>(), unit_minutes(unit)) {
                found = Some((n * unit).round() as u32);
                continue;
            }
        }

        let Some(unit) = unit_minutes(token) else { continue };
        let before = |back: usize| i.checked_sub(back).map(|j| tokens[j]);
        let amount = match (before(2), before(1)) {
            (Some("half"), Some("an" | "a")) => Some(0.5),
            (_, Some(word)) => number_word(word),
            _ => None,
        };
        if let Some(n) = amount {
            let mut minutes = n * unit;
            // "an hour and a half"
            if tokens.get(i + 1..i + 4) == Some(&["and", "a", "half"][..]) {
                minutes += unit / 2.0;
            }
            found = Some(minutes.round() as u32);
        }
    }
    found.filter(|m| *m > 0)
}

fn weekday_of(token: &str) -> Option<usize> {
    let token = token.trim_end_matches('s');
    WEEKDAYS.iter().position(|day| {
        let day = day.to_lowercase();
        token == day || (token.len() >= 3 && day.starts_with(token))
    })
}

/// Weekday names and ranges such as "Monday-Wednesday" or "tue through thu"
fn parse_days(tokens: &[&str]) -> Option<Vec<&'static str>> {
    if tokens.iter().any(|t| *t == "weekdays" || *t == "week") {
        return Some(WEEKDAYS.to_vec());
    }

    let mut picked: Vec<usize> = Vec::new();
    let mut pending_range = false;
    for token in tokens {
        if let Some(day) = weekday_of(token) {
            match picked.last() {
                Some(&from) if pending_range && from < day => picked.extend(from + 1..=day),
                _ => picked.push(day),
            }
            pending_range = false;
        } else if matches!(*token, "-" | "to" | "through" | "thru" | "until") {
            pending_range = !picked.is_empty();
        }
    }
    picked.sort_unstable();
    picked.dedup();
    if picked.is_empty() {
        None
    } else {
        Some(picked.into_iter().map(|i| WEEKDAYS[i]).collect())
    }
}

fn clock_after(tokens: &[&str], i: usize) -> Option<u32> {
    let raw = tokens.get(i + 1)?;
    let meridiem = tokens
        .get(i + 2)
        .filter(|t| matches!(**t, "am" | "pm"))
        .copied()
        .unwrap_or("");
    if let Some(m) = parse_clock(&format!("{} {}", raw, meridiem)) {
        return Some(m);
    }
    // bare "after 2" means the afternoon inside working hours
    let hour: u32 = raw.parse().ok()?;
    match hour {
        1..=8 => Some((hour + 12) * 60),
        9..=17 => Some(hour * 60),
        _ => None,
    }
}

fn parse_window(tokens: &[&str], lunch: bool) -> Option<(u32, u32)> {
    let morning = tokens.iter().any(|t| t.starts_with("morning"));
    let afternoon = tokens.iter().any(|t| t.starts_with("afternoon"));
    let mut window = match (morning, afternoon) {
        (true, false) => Some((DAY_START, 12 * 60)),
        (false, true) => Some((12 * 60, DAY_END)),
        (true, true) => Some((DAY_START, DAY_END)),
        (false, false) if lunch => Some(LUNCH_WINDOW),
        (false, false) => None,
    };

    for (i, token) in tokens.iter().enumerate() {
        let bound = match *token {
            "after" | "from" => clock_after(tokens, i).map(|m| (Some(m), None)),
            "before" | "by" => clock_after(tokens, i).map(|m| (None, Some(m))),
            _ => None,
        };
        if let Some((start, end)) = bound {
            let (s, e) = window.unwrap_or((DAY_START, DAY_END));
            window = Some((start.unwrap_or(s), end.unwrap_or(e)));
        }
    }
    window
}

/// "at Huntsman Hall" / "in JMHH": capitalized words after the preposition
fn parse_location(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if !matches!(word.to_lowercase().as_str(), "at" | "in") {
            continue;
        }
        let place: Vec<&str> = words[i + 1..]
            .iter()
            .map(|w| w.trim_end_matches(|c: char| !c.is_alphanumeric()))
            .take_while(|w| {
                w.chars().next().is_some_and(|c| c.is_uppercase()) && weekday_of(&w.to_lowercase()).is_none()
            })
            .collect();
        if !place.is_empty() && !matches!(place[0], "Zoom" | "I") {
            return Some(place.join(" "));
        }
    }
    None
}

pub fn format_clock(minutes: u32) -> String {
    let (hour, minute) = (minutes / 60, minutes % 60);
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display, minute, meridiem)
}

pub fn format_duration(minutes: u32) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{} minutes", m),
    }
}

/// Hourly slot with the attendees it suits
struct Slot<'a> {
    day: &'static str,
    start: u32,
    free_optional: usize,
    busy_optional: Vec<&'a Attendee>,
}

fn is_free(who: &AttendeeAvailability, day: &str, start: u32, end: u32) -> bool {
    !who.busy.iter().any(|b| b.overlaps(day, start, end))
}

/// Scan hourly starts; every `required` attendee must be free, ties go to the
/// earliest slot with the most optional attendees free.
fn best_slot<'a>(
    attendees: &'a [AttendeeAvailability],
    required: impl Fn(&Attendee) -> bool,
    days: &[&'static str],
    window: (u32, u32),
    duration: u32,
    exclude: Option<(&str, u32)>,
) -> Option<Slot<'a>> {
    let from = window.0.max(DAY_START);
    let until = window.1.min(DAY_END);
    let first = from.div_ceil(60) * 60;

    let mut best: Option<Slot<'a>> = None;
    for &day in days {
        let mut start = first;
        while start + duration <= until {
            let end = start + duration;
            let excluded = exclude
                .is_some_and(|(d, s)| d.trim().eq_ignore_ascii_case(day) && s == start);
            let required_free = attendees
                .iter()
                .filter(|a| required(&a.attendee))
                .all(|a| is_free(a, day, start, end));

            if !excluded && required_free {
                let busy_optional: Vec<&Attendee> = attendees
                    .iter()
                    .filter(|a| !required(&a.attendee) && !is_free(a, day, start, end))
                    .map(|a| &a.attendee)
                    .collect();
                let free_optional = attendees.iter().filter(|a| !required(&a.attendee)).count()
                    - busy_optional.len();
                if best.as_ref().map_or(true, |b| free_optional > b.free_optional) {
                    best = Some(Slot {
                        day,
                        start,
                        free_optional,
                        busy_optional,
                    });
                }
            }
            start += 60;
        }
    }
    best
}

pub struct RuleBasedOracle {
    default_location: String,
    lunch_spots: Vec<String>,
}

impl Default for RuleBasedOracle {
    fn default() -> Self {
        Self::new("Huntsman Hall")
    }
}

impl RuleBasedOracle {
    pub fn new(default_location: impl Into<String>) -> Self {
        Self {
            default_location: default_location.into(),
            lunch_spots: DEFAULT_LUNCH_SPOTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_lunch_spots(mut self, spots: Vec<String>) -> Self {
        self.lunch_spots = spots;
        self
    }

    fn proposal_for(
        &self,
        slot: &Slot<'_>,
        attendees: &[AttendeeAvailability],
        duration: u32,
        prefs: &Preferences,
    ) -> Proposal {
        let total_critical = attendees.iter().filter(|a| a.attendee.critical).count() as u32;
        let total_non_critical = attendees.len() as u32 - total_critical;
        let location = match &prefs.location {
            Some(place) => place.clone(),
            None if prefs.zoom && !prefs.in_person => "Zoom".to_string(),
            None if prefs.lunch => "TBD".to_string(),
            None => self.default_location.clone(),
        };
        let reasoning = format!(
            "Free for all {} critical attendee(s) and {} of {} others",
            total_critical, slot.free_optional, total_non_critical
        );

        Proposal {
            day: slot.day.to_string(),
            time: format_clock(slot.start),
            duration: format_duration(duration),
            location,
            includes_zoom: prefs.zoom,
            reasoning,
            critical_count: total_critical,
            total_critical,
            non_critical_count: slot.free_optional as u32,
            total_non_critical,
            is_lunch_meeting: prefs.lunch,
            unavailable: slot.busy_optional.iter().map(|a| a.email.clone()).collect(),
        }
    }
}

#[async_trait]
impl ReasoningOracle for RuleBasedOracle {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, OracleError> {
        let prefs = request
            .transcript
            .iter()
            .filter(|t| t.role == TurnRole::Host)
            .map(|t| t.content.as_str())
            .chain(std::iter::once(request.user_turn.as_str()))
            .map(Preferences::parse)
            .fold(Preferences::default(), Preferences::merge);
        debug!(?prefs, "Parsed host preferences");

        let Some(duration) = prefs.duration else {
            return Ok(Interpretation::clarify(
                "How long should the meeting be? For example \"30 minutes\" or \"1 hour\".",
            ));
        };

        let days = prefs.days.clone().unwrap_or_else(|| WEEKDAYS.to_vec());
        let window = prefs.window.unwrap_or((DAY_START, DAY_END));
        let slot = best_slot(
            &request.attendees,
            |a| a.critical,
            &days,
            window,
            duration,
            None,
        );

        let Some(slot) = slot else {
            return Ok(Interpretation::clarify(format!(
                "I couldn't find a {} slot on {} between {} and {} that works for every critical attendee. \
                 Could you suggest other days or a wider time range?",
                format_duration(duration),
                days.join(", "),
                format_clock(window.0.max(DAY_START)),
                format_clock(window.1.min(DAY_END)),
            )));
        };

        let proposal = self.proposal_for(&slot, &request.attendees, duration, &prefs);
        let optional_note = if proposal.total_non_critical == 0 {
            String::new()
        } else {
            format!(
                " and {} of {} other attendee(s)",
                proposal.non_critical_count, proposal.total_non_critical
            )
        };
        let text = format!(
            "How about {} for {}? It works for every critical attendee{}. Location: {}{}. \
             Would you like me to send the invites?",
            proposal.slot_label(),
            proposal.duration,
            optional_note,
            proposal.location,
            if proposal.includes_zoom { " (with Zoom link)" } else { "" },
        );

        let mut interpretation = Interpretation::propose(text, proposal);
        if prefs.lunch && prefs.location.is_none() {
            interpretation.lunch_recommendations = self.lunch_spots.clone();
        }
        Ok(interpretation)
    }

    async fn find_alternative(
        &self,
        request: &AlternativeRequest,
    ) -> Result<SuggestedAlternative, OracleError> {
        let current = &request.current;
        let tokens: Vec<&str> = current.duration.split_whitespace().collect();
        let duration = parse_duration(&tokens).unwrap_or(60);

        // nearest day first, starting with the original one
        let offset = weekday_of(&current.day.to_lowercase()).unwrap_or(0);
        let days: Vec<&'static str> = (0..WEEKDAYS.len())
            .map(|i| WEEKDAYS[(offset + i) % WEEKDAYS.len()])
            .collect();
        let exclude = parse_clock(&current.time).map(|start| (current.day.as_str(), start));

        let declined = &request.declined;
        let slot = best_slot(
            &request.attendees,
            |a| a.critical || a.matches(&declined.email),
            &days,
            (DAY_START, DAY_END),
            duration,
            exclude,
        )
        .ok_or(OracleError::NoCandidate)?;

        let prefs = Preferences {
            zoom: current.includes_zoom,
            lunch: current.is_lunch_meeting,
            location: Some(current.location.clone()).filter(|l| !l.is_empty()),
            ..Preferences::default()
        };
        let mut proposal = self.proposal_for(&slot, &request.attendees, duration, &prefs);
        proposal.duration = current.duration.clone();
        let rationale = format!(
            "{} is free for every critical attendee including {}, and for {} of {} others.",
            proposal.slot_label(),
            declined.short_name(),
            proposal.non_critical_count,
            proposal.total_non_critical
        );
        proposal.reasoning = rationale.clone();

        Ok(SuggestedAlternative {
            proposal,
            rationale,
        })
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{BusyInterval, Turn};
    use rstest::rstest;

    fn wharton() -> Vec<AttendeeAvailability> {
        vec![
            AttendeeAvailability {
                attendee: Attendee::new("Gayatri Sriram", "gayatri1@wharton.upenn.edu"),
                busy: vec![
                    BusyInterval::new("Monday", "9:00 AM", "10:30 AM"),
                    BusyInterval::new("Tuesday", "11:00 AM", "12:30 PM"),
                ],
            },
            AttendeeAvailability {
                attendee: Attendee::new("Manan Dadhania", "dadhania@wharton.upenn.edu"),
                busy: vec![
                    BusyInterval::new("Monday", "10:00 AM", "11:30 AM"),
                    BusyInterval::new("Tuesday", "2:00 PM", "4:00 PM"),
                ],
            },
            AttendeeAvailability {
                attendee: Attendee::new("Ash Rk", "ashrk@wharton.upenn.edu").critical(),
                busy: vec![
                    BusyInterval::new("Monday", "1:00 PM", "2:30 PM"),
                    BusyInterval::new("Wednesday", "10:00 AM", "11:30 AM"),
                ],
            },
        ]
    }

    fn tokens(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[rstest]
    #[case("30 min", Some(30))]
    #[case("1 hour", Some(60))]
    #[case("90 minutes", Some(90))]
    #[case("1.5 hours", Some(90))]
    #[case("45min", Some(45))]
    #[case("half an hour", Some(30))]
    #[case("an hour and a half", Some(90))]
    #[case("sometime monday", None)]
    fn test_parse_duration(#[case] text: &str, #[case] expected: Option<u32>) {
        assert_eq!(parse_duration(&tokens(text)), expected);
    }

    #[test]
    fn test_parse_days_with_range() {
        let prefs = Preferences::parse("Monday-Wednesday mornings please");
        assert_eq!(
            prefs.days,
            Some(vec!["Monday", "Tuesday", "Wednesday"])
        );
        assert_eq!(prefs.window, Some((DAY_START, 12 * 60)));

        let prefs = Preferences::parse("tue or thu");
        assert_eq!(prefs.days, Some(vec!["Tuesday", "Thursday"]));
    }

    #[test]
    fn test_parse_format_hints() {
        let prefs = Preferences::parse("Lunch at Houston Hall, 1 hour, zoom too");
        assert!(prefs.lunch);
        assert!(prefs.zoom);
        assert_eq!(prefs.location.as_deref(), Some("Houston Hall"));
        assert_eq!(prefs.window, Some(LUNCH_WINDOW));

        let prefs = Preferences::parse("in-person after 2pm");
        assert!(prefs.in_person);
        assert_eq!(prefs.window, Some((14 * 60, DAY_END)));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(9 * 60), "9:00 AM");
        assert_eq!(format_clock(12 * 60), "12:00 PM");
        assert_eq!(format_clock(14 * 60 + 30), "2:30 PM");
    }

    #[tokio::test]
    async fn test_interpret_asks_for_duration() {
        let oracle = RuleBasedOracle::default();
        let request = InterpretRequest {
            title: "Team Sync".into(),
            attendees: wharton(),
            transcript: vec![],
            user_turn: "Monday afternoon".into(),
        };
        let answer = oracle.interpret(&request).await.unwrap();
        assert!(answer.needs_more_info);
        assert!(answer.proposal.is_none());
        assert!(answer.response_text.contains("How long"));
    }

    #[tokio::test]
    async fn test_interpret_combines_turns_and_avoids_critical_conflicts() {
        let oracle = RuleBasedOracle::default();
        let request = InterpretRequest {
            title: "Team Sync".into(),
            attendees: wharton(),
            transcript: vec![Turn::host("Monday afternoon"), Turn::assistant("How long?")],
            user_turn: "1 hour".into(),
        };
        let answer = oracle.interpret(&request).await.unwrap();
        let proposal = answer.proposal.expect("proposal");
        // Ash is busy 1:00-2:30 PM, so 12 PM is the first slot free for everyone
        assert_eq!(proposal.slot_label(), "Monday at 12:00 PM");
        assert!(proposal.is_invitable());
        assert_eq!(proposal.non_critical_count, 2);
        assert_eq!(proposal.location, "Huntsman Hall");
    }

    #[tokio::test]
    async fn test_interpret_prefers_most_optional_attendees() {
        let oracle = RuleBasedOracle::default();
        let request = InterpretRequest {
            title: "Team Sync".into(),
            attendees: wharton(),
            transcript: vec![],
            user_turn: "Tuesday, 2 hours, over zoom".into(),
        };
        let proposal = oracle.interpret(&request).await.unwrap().proposal.unwrap();
        assert_eq!(proposal.slot_label(), "Tuesday at 9:00 AM");
        assert_eq!(proposal.duration, "2 hours");
        assert!(proposal.includes_zoom);
        assert_eq!(proposal.location, "Zoom");
        assert_eq!(proposal.non_critical_count, 2);
    }

    #[tokio::test]
    async fn test_lunch_request_gets_recommendations() {
        let oracle = RuleBasedOracle::default();
        let request = InterpretRequest {
            title: "Team Lunch".into(),
            attendees: wharton(),
            transcript: vec![],
            user_turn: "lunch on wednesday for 1 hour".into(),
        };
        let answer = oracle.interpret(&request).await.unwrap();
        let proposal = answer.proposal.unwrap();
        assert!(proposal.is_lunch_meeting);
        // Ash is busy until 11:30 AM on Wednesday
        assert_eq!(proposal.slot_label(), "Wednesday at 12:00 PM");
        assert_eq!(proposal.location, "TBD");
        assert_eq!(answer.lunch_recommendations.len(), 3);
    }

    #[tokio::test]
    async fn test_find_alternative_skips_current_slot() {
        let oracle = RuleBasedOracle::default();
        let attendees = wharton();
        let current = Proposal {
            day: "Monday".into(),
            time: "12:00 PM".into(),
            duration: "1 hour".into(),
            location: "Huntsman Hall".into(),
            includes_zoom: false,
            reasoning: String::new(),
            critical_count: 1,
            total_critical: 1,
            non_critical_count: 2,
            total_non_critical: 2,
            is_lunch_meeting: false,
            unavailable: vec![],
        };
        let request = AlternativeRequest {
            title: "Team Sync".into(),
            declined: attendees[2].attendee.clone(),
            attendees,
            current,
        };
        let alt = oracle.find_alternative(&request).await.unwrap();
        assert_ne!(alt.proposal.slot_label(), "Monday at 12:00 PM");
        assert_eq!(alt.proposal.day, "Monday");
        assert_eq!(alt.proposal.location, "Huntsman Hall");
        assert!(alt.proposal.is_invitable());
        assert!(alt.rationale.contains("Ash"));
    }
}
