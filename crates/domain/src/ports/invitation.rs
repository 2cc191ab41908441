//! InvitationSink - outbound delivery of meeting invitations

use crate::entities::{Attendee, Proposal};
use crate::RoundNumber;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything a sink needs to deliver one round of invitations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub title: String,
    pub host: String,
    pub attendees: Vec<Attendee>,
    pub proposal: Proposal,
    pub round: RoundNumber,
}

#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait InvitationSink: Send + Sync {
    /// `true` when the send was accepted for delivery
    async fn send(&self, invitation: &Invitation) -> bool;
}
