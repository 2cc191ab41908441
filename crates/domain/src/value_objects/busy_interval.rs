//! Busy interval reported by the directory for one attendee

use serde::{Deserialize, Serialize};

/// `{day, startTime, endTime}` as the directory reports it.
///
/// The negotiation core never interprets these; only oracles compare them
/// against a candidate slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

impl BusyInterval {
    pub fn new(
        day: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            day: day.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// Start/end as minutes after midnight, when both ends parse
    pub fn span_minutes(&self) -> Option<(u32, u32)> {
        let start = parse_clock(&self.start_time)?;
        let end = parse_clock(&self.end_time)?;
        (end > start).then_some((start, end))
    }

    /// True when `[start, end)` on `day` intersects this interval
    pub fn overlaps(&self, day: &str, start: u32, end: u32) -> bool {
        if !self.day.trim().eq_ignore_ascii_case(day.trim()) {
            return false;
        }
        match self.span_minutes() {
            Some((busy_start, busy_end)) => start < busy_end && busy_start < end,
            None => false,
        }
    }
}

/// Parse "9:00 AM", "2 PM" or "14:30" into minutes after midnight
pub fn parse_clock(raw: &str) -> Option<u32> {
    let text = raw.trim().to_ascii_uppercase();
    let (clock, meridiem) = if let Some(rest) = text.strip_suffix("AM") {
        (rest.trim(), Some(false))
    } else if let Some(rest) = text.strip_suffix("PM") {
        (rest.trim(), Some(true))
    } else {
        (text.as_str(), None)
    };

    let mut parts = clock.splitn(2, ':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 0,
    };
    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None if hour < 24 && parts_had_minutes(clock) => hour,
        None => return None,
    };
    Some(hour * 60 + minute)
}

// 24-hour input must carry minutes ("14:00"), a bare "14" is ambiguous
fn parts_had_minutes(clock: &str) -> bool {
    clock.contains(':')
}
