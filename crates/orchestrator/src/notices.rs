//! Host-facing message text

use domain::{
    AlternativeCandidate, Attendee, AttendeeSet, CandidateSource, Interpretation, Proposal,
    ResponseStatus,
};

pub const ORACLE_APOLOGY: &str =
    "I apologize, I encountered an error. Could you please rephrase your request?";

pub fn greeting(title: &str, attendees: &AttendeeSet) -> String {
    let critical: Vec<&str> = attendees.critical().map(|a| a.name.as_str()).collect();
    let mut text = format!(
        "Hi! Let's schedule \"{}\" with {}.",
        title,
        attendees.display_names()
    );
    if !critical.is_empty() {
        text.push_str(&format!(" Required: {}.", critical.join(", ")));
    }
    text.push_str(
        " Tell me the days or times that suit you, how long it should run, in person or on Zoom, \
         and anything special such as making it a lunch meeting.",
    );
    text
}

/// The assistant turn for an interpretation, lunch spots appended
pub fn assistant_reply(interpretation: &Interpretation) -> String {
    let mut text = interpretation.response_text.trim().to_string();
    if !interpretation.lunch_recommendations.is_empty() {
        text.push_str("\n\nLunch spots nearby:");
        for spot in &interpretation.lunch_recommendations {
            text.push_str(&format!("\n- {}", spot));
        }
    }
    text
}

pub fn meeting_summary(title: &str, proposal: &Proposal) -> String {
    let format = if proposal.includes_zoom {
        format!("{} + Zoom", proposal.location)
    } else {
        proposal.location.clone()
    };
    format!(
        "{}: {} ({}) at {}",
        title,
        proposal.slot_label(),
        proposal.duration,
        format
    )
}

pub fn invitations_sent(title: &str, proposal: &Proposal, attendees: &AttendeeSet) -> String {
    let recipients: Vec<String> = attendees
        .iter()
        .map(|a| {
            if a.critical {
                format!("{} (required)", a.name)
            } else {
                a.name.clone()
            }
        })
        .collect();
    format!(
        "Invitations sent to {} for {}. I'll let you know as responses come in.",
        recipients.join(", "),
        meeting_summary(title, proposal)
    )
}

pub fn requirements_changed() -> String {
    "The required attendees changed, so that preview no longer applies. Tell me when you'd like to meet and I'll draw up a new one."
        .to_string()
}

pub fn response_received(attendee: &Attendee, status: ResponseStatus) -> String {
    let verb = match status {
        ResponseStatus::Accepted => "accepted",
        ResponseStatus::Declined => "declined",
        ResponseStatus::Pending => "has not answered",
    };
    format!("{} {} the invitation.", attendee.name, verb)
}

pub fn alternative_offer(candidate: &AlternativeCandidate) -> String {
    let origin = match candidate.source {
        CandidateSource::Oracle => "I found another time that works for everyone required",
        CandidateSource::Fallback => "I couldn't find a better slot, so here is the default",
    };
    format!(
        "{} can't make it. {}: {} ({}). {}\nReschedule to this time? (yes / no)",
        candidate.declined.name,
        origin,
        candidate.proposal.slot_label(),
        candidate.proposal.duration,
        candidate.rationale
    )
}

pub fn rescheduled(proposal: &Proposal) -> String {
    format!(
        "Rescheduled to {}. New invitations are on their way.",
        proposal.slot_label()
    )
}

pub fn locked_in(proposal: &Proposal, declined: &Attendee) -> String {
    format!(
        "Keeping {}. {} won't be able to attend.",
        proposal.slot_label(),
        declined.name
    )
}

pub fn resolved_as_proposed(proposal: &Proposal) -> String {
    format!(
        "Everyone has responded. The meeting is set for {}.",
        proposal.slot_label()
    )
}
