//! Events published by a negotiator on its own bus

use crate::session::{NegotiationState, Resolution};
use common::topics::{
    TOPIC_ALTERNATIVE, TOPIC_INVITATIONS, TOPIC_RESOLVED, TOPIC_RESPONSE, TOPIC_STATE, TOPIC_TURN,
};
use common::{EventBus, Topic};
use domain::{AlternativeCandidate, Proposal, ResponseStatus, RoundNumber, Turn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationEvent {
    TurnAppended {
        session_id: Uuid,
        turn: Turn,
    },
    StateChanged {
        session_id: Uuid,
        from: NegotiationState,
        to: NegotiationState,
    },
    InvitationsSent {
        session_id: Uuid,
        round: RoundNumber,
        proposal: Proposal,
    },
    ResponseRecorded {
        session_id: Uuid,
        round: RoundNumber,
        email: String,
        status: ResponseStatus,
    },
    AlternativeProposed {
        session_id: Uuid,
        candidate: AlternativeCandidate,
    },
    Resolved {
        session_id: Uuid,
        resolution: Resolution,
    },
}

impl NegotiationEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::TurnAppended { .. } => TOPIC_TURN,
            Self::StateChanged { .. } => TOPIC_STATE,
            Self::InvitationsSent { .. } => TOPIC_INVITATIONS,
            Self::ResponseRecorded { .. } => TOPIC_RESPONSE,
            Self::AlternativeProposed { .. } => TOPIC_ALTERNATIVE,
            Self::Resolved { .. } => TOPIC_RESOLVED,
        }
    }
}

pub type NegotiationBus = EventBus<NegotiationEvent>;

/// Publish in the order the changes were made
pub async fn publish_all(bus: &NegotiationBus, events: Vec<NegotiationEvent>) {
    for event in events {
        bus.publish(event.topic(), event).await;
    }
}
