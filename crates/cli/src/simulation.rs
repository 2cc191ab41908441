//! Scripted attendee responses
//!
//! Listens for invitation rounds on the negotiator's bus and answers on
//! behalf of every attendee: in the first round the configured decliner
//! says no and everyone else says yes; later rounds are accepted by all.

use crate::config::SimulationConfig;
use common::topics::TOPIC_INVITATIONS;
use domain::{normalize_email, Decision, RoundNumber};
use orchestrator::{NegotiationEvent, Negotiator, ResponseOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Responses for one round, in the order they are sent
pub fn scripted_responses(
    attendees: &[String],
    round: RoundNumber,
    decliner: Option<&str>,
) -> Vec<(String, Decision)> {
    let decliner = decliner
        .filter(|_| round == 1)
        .map(normalize_email)
        .filter(|d| attendees.iter().any(|a| normalize_email(a) == *d));

    let mut script: Vec<(String, Decision)> = attendees
        .iter()
        .filter(|email| Some(normalize_email(email)) != decliner)
        .map(|email| (email.clone(), Decision::Accepted))
        .collect();
    if let Some(decliner) = decliner {
        script.push((decliner, Decision::Declined));
    }
    script
}

pub struct ResponseSimulator {
    negotiator: Arc<Negotiator>,
    config: SimulationConfig,
}

impl ResponseSimulator {
    pub fn new(negotiator: Arc<Negotiator>, config: SimulationConfig) -> Self {
        Self { negotiator, config }
    }

    /// Subscribe before invitations go out. The task holds the negotiator,
    /// which keeps the bus open, so the owner must abort the returned handle.
    pub async fn spawn(self) -> JoinHandle<()> {
        let mut invitations = self.negotiator.subscribe(TOPIC_INVITATIONS).await;
        tokio::spawn(async move {
            loop {
                match invitations.recv().await {
                    Ok(envelope) => {
                        if let NegotiationEvent::InvitationsSent { round, .. } = envelope.payload {
                            self.answer_round(round).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Simulator missed invitation events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn answer_round(&self, round: RoundNumber) {
        let attendees: Vec<String> = self
            .negotiator
            .snapshot()
            .await
            .attendees
            .iter()
            .map(|a| a.email.clone())
            .collect();
        let script = scripted_responses(&attendees, round, self.config.decliner.as_deref());
        info!(round, responses = script.len(), "Simulating attendee responses");

        for (email, decision) in script {
            tokio::time::sleep(Duration::from_millis(self.config.response_delay_ms)).await;
            match self.negotiator.record_response(&email, decision).await {
                Ok(ResponseOutcome::AlternativeProposed(_)) | Ok(ResponseOutcome::Resolved) => {
                    debug!(round, "Round settled by simulated responses");
                    return;
                }
                Ok(outcome) => debug!(%email, ?outcome, "Simulated response applied"),
                Err(e) => {
                    debug!(%email, error = %e, "Simulated response not applied");
                    return;
                }
            }
        }
    }
}
