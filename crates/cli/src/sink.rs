//! Invitation delivery to the terminal

use async_trait::async_trait;
use console::style;
use domain::{Invitation, InvitationSink};
use tracing::info;

/// Prints each invitation round instead of emailing it
#[derive(Debug, Clone, Default)]
pub struct ConsoleInvitationSink;

pub fn render_invitation(invitation: &Invitation) -> String {
    let proposal = &invitation.proposal;
    let mut lines = vec![
        format!("Invitation #{}: {}", invitation.round, invitation.title),
        format!("  When:  {} ({})", proposal.slot_label(), proposal.duration),
        format!(
            "  Where: {}{}",
            proposal.location,
            if proposal.includes_zoom { " + Zoom" } else { "" }
        ),
        format!("  From:  {}", invitation.host),
    ];
    for attendee in &invitation.attendees {
        let tag = if attendee.critical { " (required)" } else { "" };
        lines.push(format!("  To:    {} <{}>{}", attendee.name, attendee.email, tag));
    }
    lines.join("\n")
}

#[async_trait]
impl InvitationSink for ConsoleInvitationSink {
    async fn send(&self, invitation: &Invitation) -> bool {
        info!(
            round = invitation.round,
            recipients = invitation.attendees.len(),
            "Delivering invitations"
        );
        println!("{}", style(render_invitation(invitation)).dim());
        true
    }
}
