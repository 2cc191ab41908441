//! Response tracking for the current invitation round

use crate::session::{NegotiationSession, NegotiationState};
use domain::{
    normalize_email, Attendee, Decision, NegotiationError, NegotiationResult, RecordOutcome,
    ResponseStatus,
};

/// What applying one attendee response did to the round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// The attendee had already answered this round; nothing changed
    Duplicate(ResponseStatus),
    Applied {
        status: ResponseStatus,
        all_responded: bool,
        /// Set only for the decline that claimed this round's conflict resolution
        trigger: Option<Attendee>,
    },
}

pub struct ResponseTracker;

impl ResponseTracker {
    /// Apply a response to the session's current round.
    ///
    /// Only valid while invitations are being monitored. Unknown emails
    /// leave the session untouched. A mandatory decline claims conflict
    /// resolution for the round unless an earlier decline already did.
    pub fn apply(
        session: &mut NegotiationSession,
        email: &str,
        decision: Decision,
    ) -> NegotiationResult<TrackerUpdate> {
        let email = normalize_email(email);
        if session.state != NegotiationState::Monitoring {
            return Err(NegotiationError::OutOfOrderEvent {
                email,
                state: session.state.to_string(),
            });
        }
        let attendee = session
            .attendees
            .get(&email)
            .cloned()
            .ok_or_else(|| NegotiationError::UnknownAttendee {
                email: email.clone(),
            })?;

        let status = match session.responses.record(&email, decision) {
            RecordOutcome::Applied(status) => status,
            RecordOutcome::AlreadyDecided(status) => return Ok(TrackerUpdate::Duplicate(status)),
            RecordOutcome::UnknownAttendee => {
                return Err(NegotiationError::UnknownAttendee { email })
            }
        };

        let trigger = (status == ResponseStatus::Declined
            && attendee.critical
            && session.responses.claim_conflict(&email))
        .then_some(attendee);

        Ok(TrackerUpdate::Applied {
            status,
            all_responded: session.responses.all_responded(),
            trigger,
        })
    }

    pub fn pending(session: &NegotiationSession) -> usize {
        session.responses.count(ResponseStatus::Pending)
    }
}
