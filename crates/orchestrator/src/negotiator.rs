//! Negotiator - drives one negotiation session from setup to resolution
//!
//! # Concurrency
//!
//! The session lives behind a single async mutex. Host operations that call
//! an adapter hold the one-permit `turn_slot` for their whole duration, so a
//! second host call while one is in flight fails fast with
//! [`NegotiationError::TurnInFlight`]. Directory and oracle calls run with the
//! session lock released; their results are applied after re-locking and
//! re-checking the state. Attendee responses are serialized by the session
//! lock and may arrive from any task.
//!
//! Conflict resolution runs on a task the negotiator spawns. Dropping the
//! `record_response` future that triggered it does not stop it: the
//! alternative is still stored and announced on the event bus.

use crate::config::NegotiatorConfig;
use crate::conflict::ConflictResolutionEngine;
use crate::events::{publish_all, NegotiationBus, NegotiationEvent};
use crate::notices;
use crate::reliability::with_oracle_timeout;
use crate::session::{NegotiationSession, NegotiationState, OracleContext, Resolution};
use crate::tracker::{ResponseTracker, TrackerUpdate};
use common::{EventEnvelope, OperationTimer, Topic};
use domain::{
    AlternativeCandidate, AlternativeRequest, Attendee, BusyInterval, Decision, DirectoryAdapter,
    HostDecision, InterpretRequest, Invitation, InvitationSink, NegotiationError,
    NegotiationResult, Proposal, ReasoningOracle, ResponseMap, ResponseStatus, Turn,
    ValidationError,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What kind of assistant output a [`HostReply`] carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Greeting,
    /// The assistant needs more details
    Question,
    /// A new proposal is ready for preview
    Proposal,
    /// The oracle failed; the host should rephrase
    Apology,
    Notice,
}

/// Message for the host plus the session state after the operation
#[derive(Debug, Clone, PartialEq)]
pub struct HostReply {
    pub kind: ReplyKind,
    pub message: String,
    pub state: NegotiationState,
    pub proposal: Option<Proposal>,
}

/// Effect of one attendee response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Recorded; `remaining` attendees have yet to answer this round
    Waiting { remaining: usize },
    /// The attendee had already answered this round
    Duplicate(ResponseStatus),
    /// Everyone answered with no mandatory decline
    Resolved,
    /// This decline started conflict resolution and produced a candidate
    AlternativeProposed(AlternativeCandidate),
    /// Recorded, but conflict resolution for this round was already claimed
    ConflictPending,
}

pub struct Negotiator {
    /// Session identity, fixed for the negotiator's lifetime
    id: Uuid,

    session: Arc<Mutex<NegotiationSession>>,

    /// At most one host-initiated adapter call at a time
    turn_slot: Arc<Semaphore>,

    directory: Arc<dyn DirectoryAdapter>,
    oracle: Arc<dyn ReasoningOracle>,
    sink: Arc<dyn InvitationSink>,

    events: NegotiationBus,
    config: NegotiatorConfig,
}

impl Negotiator {
    pub fn new(
        directory: Arc<dyn DirectoryAdapter>,
        oracle: Arc<dyn ReasoningOracle>,
        sink: Arc<dyn InvitationSink>,
        config: NegotiatorConfig,
    ) -> Self {
        let session = NegotiationSession::new();
        info!(session_id = %session.id, oracle = oracle.name(), "Negotiation session created");
        Self {
            id: session.id,
            session: Arc::new(Mutex::new(session)),
            turn_slot: Arc::new(Semaphore::new(1)),
            directory,
            oracle,
            sink,
            events: NegotiationBus::new(config.event_buffer),
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    pub async fn state(&self) -> NegotiationState {
        self.session.lock().await.state.clone()
    }

    /// Point-in-time copy of the whole session
    pub async fn snapshot(&self) -> NegotiationSession {
        self.session.lock().await.clone()
    }

    pub async fn subscribe(&self, topic: Topic) -> broadcast::Receiver<EventEnvelope<NegotiationEvent>> {
        self.events.subscribe(topic).await
    }

    pub fn subscribe_all(&self) -> broadcast::Receiver<EventEnvelope<NegotiationEvent>> {
        self.events.subscribe_all()
    }

    // --- setup -------------------------------------------------------------

    pub async fn set_host(&self, email: &str) -> NegotiationResult<()> {
        let mut session = self.session.lock().await;
        require_setup(&session, "set_host")?;
        session.set_host(email)?;
        Ok(())
    }

    pub async fn set_title(&self, title: &str) -> NegotiationResult<()> {
        let mut session = self.session.lock().await;
        require_setup(&session, "set_title")?;
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }
        session.title = title.to_string();
        Ok(())
    }

    pub async fn add_attendee(&self, attendee: Attendee) -> NegotiationResult<()> {
        let mut session = self.session.lock().await;
        require_setup(&session, "add_attendee")?;
        if !attendee.email.contains('@') {
            return Err(ValidationError::InvalidEmail(attendee.email).into());
        }
        debug!(session_id = %self.id, email = %attendee.email, critical = attendee.critical, "Adding attendee");
        session.attendees.add(attendee)?;
        Ok(())
    }

    pub async fn remove_attendee(&self, email: &str) -> NegotiationResult<Attendee> {
        let mut session = self.session.lock().await;
        require_setup(&session, "remove_attendee")?;
        session
            .attendees
            .remove(email)
            .ok_or_else(|| NegotiationError::UnknownAttendee {
                email: email.to_string(),
            })
    }

    /// Criticality may change until invitations go out. A change while a
    /// proposal is in preview withdraws it, since its critical counts no
    /// longer describe the attendee set.
    pub async fn set_critical(&self, email: &str, critical: bool) -> NegotiationResult<()> {
        let mut events = Vec::new();
        {
            let mut session = self.session.lock().await;
            if !session.state.allows_criticality_edit() {
                return Err(NegotiationError::AttendeesLocked);
            }
            let was_critical = session
                .attendees
                .get(email)
                .map(|a| a.critical)
                .ok_or_else(|| NegotiationError::UnknownAttendee {
                    email: email.to_string(),
                })?;
            session.attendees.set_critical(email, critical);

            if was_critical != critical && session.state == NegotiationState::Preview {
                info!(session_id = %self.id, email, critical, "Criticality changed, preview withdrawn");
                session.proposal = None;
                session.push_turn(Turn::system(notices::requirements_changed()), &mut events);
                session.transition(NegotiationState::Dialogue, &mut events);
            }
        }
        publish_all(&self.events, events).await;
        Ok(())
    }

    /// Validate setup, greet the host and open the dialogue
    pub async fn start_dialogue(&self) -> NegotiationResult<HostReply> {
        let mut events = Vec::new();
        let reply = {
            let mut session = self.session.lock().await;
            require_setup(&session, "start_dialogue")?;
            session.validate_setup()?;

            let greeting = notices::greeting(&session.title, &session.attendees);
            session.push_turn(Turn::assistant(greeting.clone()), &mut events);
            session.transition(NegotiationState::Dialogue, &mut events);
            info!(
                session_id = %self.id,
                title = %session.title,
                attendees = session.attendees.len(),
                critical = session.attendees.critical_count(),
                "Dialogue started"
            );
            host_reply(ReplyKind::Greeting, greeting, &session)
        };
        publish_all(&self.events, events).await;
        Ok(reply)
    }

    // --- dialogue ----------------------------------------------------------

    /// Send one host message to the oracle.
    ///
    /// A proposal moves the session to PREVIEW, replacing any earlier one.
    /// A clarifying question leaves state and proposal alone. Oracle failures
    /// become an apology turn and are not returned as errors.
    pub async fn submit_turn(&self, text: &str) -> NegotiationResult<HostReply> {
        let _permit = self
            .turn_slot
            .try_acquire()
            .map_err(|_| NegotiationError::TurnInFlight)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyTurn.into());
        }

        let mut events = Vec::new();
        let (context, transcript) = {
            let mut session = self.session.lock().await;
            if !session.state.accepts_turns() {
                return Err(invalid_transition(&session, "submit_turn"));
            }
            let transcript = session.transcript.dialogue();
            session.push_turn(Turn::host(text), &mut events);
            (OracleContext::of(&session), transcript)
        };
        publish_all(&self.events, events).await;

        let busy = fetch_busy(self.directory.as_ref(), &context).await;
        let request = InterpretRequest {
            title: context.title.clone(),
            attendees: context.with_busy(busy),
            transcript,
            user_turn: text.to_string(),
        };
        let interpretation = with_oracle_timeout(
            "interpret",
            self.config.oracle_timeout(),
            self.oracle.interpret(&request),
        )
        .await;

        let mut events = Vec::new();
        let reply = {
            let mut session = self.session.lock().await;
            if !session.state.accepts_turns() {
                return Err(invalid_transition(&session, "submit_turn"));
            }
            match interpretation {
                Ok(interpretation) => {
                    let message = notices::assistant_reply(&interpretation);
                    session.push_turn(Turn::assistant(message.clone()), &mut events);
                    match interpretation.proposal {
                        Some(proposal) => {
                            info!(
                                session_id = %self.id,
                                slot = %proposal.slot_label(),
                                invitable = proposal.is_invitable(),
                                "Proposal ready for preview"
                            );
                            session.proposal = Some(proposal);
                            session.transition(NegotiationState::Preview, &mut events);
                            host_reply(ReplyKind::Proposal, message, &session)
                        }
                        None => host_reply(ReplyKind::Question, message, &session),
                    }
                }
                Err(e) => {
                    warn!(session_id = %self.id, error = %e, "Interpretation failed");
                    let message = notices::ORACLE_APOLOGY.to_string();
                    session.push_turn(Turn::assistant(message.clone()), &mut events);
                    host_reply(ReplyKind::Apology, message, &session)
                }
            }
        };
        publish_all(&self.events, events).await;
        Ok(reply)
    }

    /// Send the previewed proposal to every attendee and start monitoring
    pub async fn confirm_and_send(&self) -> NegotiationResult<HostReply> {
        let _permit = self
            .turn_slot
            .try_acquire()
            .map_err(|_| NegotiationError::TurnInFlight)?;

        let mut events = Vec::new();
        let reply = {
            let mut session = self.session.lock().await;
            if session.state != NegotiationState::Preview {
                return Err(invalid_transition(&session, "confirm_and_send"));
            }
            let proposal = session.proposal.clone().ok_or(NegotiationError::NoProposal)?;
            if !proposal.covers(&session.attendees) {
                let missing = proposal
                    .missing_critical(&session.attendees)
                    .into_iter()
                    .map(|a| a.name.clone())
                    .collect();
                return Err(NegotiationError::ProposalIneligible { missing });
            }

            let round = session.round() + 1;
            self.deliver(&session, &proposal, round).await?;
            let message = self.start_round(&mut session, proposal, round, &mut events);
            host_reply(ReplyKind::Notice, message, &session)
        };
        publish_all(&self.events, events).await;
        Ok(reply)
    }

    // --- monitoring --------------------------------------------------------

    /// Apply one attendee response.
    ///
    /// Responses outside monitoring are dropped with
    /// [`NegotiationError::OutOfOrderEvent`]; unknown attendees leave the
    /// session untouched. The first mandatory decline of a round runs the
    /// conflict resolution engine before this returns; the resolution itself
    /// completes even if this future is dropped.
    pub async fn record_response(
        &self,
        email: &str,
        decision: Decision,
    ) -> NegotiationResult<ResponseOutcome> {
        let mut events = Vec::new();
        let (context, current, declined, round) = {
            let mut session = self.session.lock().await;
            let update = match ResponseTracker::apply(&mut session, email, decision) {
                Ok(update) => update,
                Err(e) => {
                    warn!(session_id = %self.id, email, error = %e, "Response ignored");
                    return Err(e);
                }
            };

            let (status, all_responded, trigger) = match update {
                TrackerUpdate::Duplicate(status) => {
                    debug!(session_id = %self.id, email, %status, "Duplicate response ignored");
                    return Ok(ResponseOutcome::Duplicate(status));
                }
                TrackerUpdate::Applied {
                    status,
                    all_responded,
                    trigger,
                } => (status, all_responded, trigger),
            };

            if let Some(attendee) = session.attendees.get(email).cloned() {
                info!(session_id = %self.id, email = %attendee.email, %status, round = session.round(), "Response recorded");
                session.push_turn(
                    Turn::system(notices::response_received(&attendee, status)),
                    &mut events,
                );
                events.push(NegotiationEvent::ResponseRecorded {
                    session_id: self.id,
                    round: session.round(),
                    email: attendee.email,
                    status,
                });
            }

            match trigger {
                Some(declined) => {
                    let current = session.proposal.clone().ok_or(NegotiationError::NoProposal)?;
                    (OracleContext::of(&session), current, declined, session.round())
                }
                None if session.responses.conflict_claimed_by().is_some() => {
                    drop(session);
                    publish_all(&self.events, events).await;
                    return Ok(ResponseOutcome::ConflictPending);
                }
                None if all_responded => {
                    let resolution = Resolution::AsProposed;
                    if let Some(proposal) = session.proposal.clone() {
                        session.push_turn(
                            Turn::system(notices::resolved_as_proposed(&proposal)),
                            &mut events,
                        );
                    }
                    session.transition(NegotiationState::Resolved(resolution.clone()), &mut events);
                    events.push(NegotiationEvent::Resolved {
                        session_id: self.id,
                        resolution,
                    });
                    info!(session_id = %self.id, "All attendees responded, meeting resolved");
                    drop(session);
                    publish_all(&self.events, events).await;
                    return Ok(ResponseOutcome::Resolved);
                }
                None => {
                    let remaining = ResponseTracker::pending(&session);
                    drop(session);
                    publish_all(&self.events, events).await;
                    return Ok(ResponseOutcome::Waiting { remaining });
                }
            }
        };
        publish_all(&self.events, events).await;

        let run = ConflictRun {
            session_id: self.id,
            session: self.session.clone(),
            turn_slot: self.turn_slot.clone(),
            directory: self.directory.clone(),
            engine: ConflictResolutionEngine::new(
                self.oracle.clone(),
                self.config.oracle_timeout(),
                self.config.default_location.clone(),
            ),
            events: self.events.clone(),
        };
        let candidate = tokio::spawn(run.run(context, current, declined, round))
            .await
            .map_err(|e| {
                warn!(session_id = %self.id, error = %e, "Conflict resolution task failed");
                NegotiationError::ResolutionInterrupted(e.to_string())
            })??;
        Ok(ResponseOutcome::AlternativeProposed(candidate))
    }

    /// Host answer to the alternative: reschedule or keep the original
    pub async fn decide(&self, input: &str) -> NegotiationResult<HostReply> {
        let _permit = self
            .turn_slot
            .try_acquire()
            .map_err(|_| NegotiationError::TurnInFlight)?;

        let mut events = Vec::new();
        let reply = {
            let mut session = self.session.lock().await;
            if session.state != NegotiationState::AlternativeProposed {
                return Err(invalid_transition(&session, "decide"));
            }
            let decision =
                HostDecision::parse(input).ok_or_else(|| NegotiationError::InvalidDecisionInput {
                    input: input.trim().to_string(),
                })?;
            let candidate = session
                .alternative
                .clone()
                .ok_or(NegotiationError::NoProposal)?;

            match decision {
                HostDecision::Accept => {
                    if !candidate.proposal.covers(&session.attendees) {
                        let missing = candidate
                            .proposal
                            .missing_critical(&session.attendees)
                            .into_iter()
                            .map(|a| a.name.clone())
                            .collect();
                        return Err(NegotiationError::ProposalIneligible { missing });
                    }
                    let round = session.round() + 1;
                    self.deliver(&session, &candidate.proposal, round).await?;
                    session.push_turn(Turn::host(input.trim()), &mut events);
                    self.start_round(&mut session, candidate.proposal.clone(), round, &mut events);
                    let message = notices::rescheduled(&candidate.proposal);
                    session.push_turn(Turn::assistant(message.clone()), &mut events);
                    info!(session_id = %self.id, slot = %candidate.proposal.slot_label(), round, "Alternative accepted");
                    host_reply(ReplyKind::Notice, message, &session)
                }
                HostDecision::Reject => {
                    let original = session
                        .proposal
                        .clone()
                        .ok_or(NegotiationError::NoProposal)?;
                    session.responses.mark_declined(&candidate.declined.email);
                    session.alternative = None;
                    session.push_turn(Turn::host(input.trim()), &mut events);
                    let message = notices::locked_in(&original, &candidate.declined);
                    session.push_turn(Turn::assistant(message.clone()), &mut events);

                    let resolution = Resolution::LockedIn {
                        declined: candidate.declined.clone(),
                    };
                    session.transition(NegotiationState::Resolved(resolution.clone()), &mut events);
                    events.push(NegotiationEvent::Resolved {
                        session_id: self.id,
                        resolution,
                    });
                    info!(session_id = %self.id, declined = %candidate.declined.email, "Original time locked in");
                    host_reply(ReplyKind::Notice, message, &session)
                }
            }
        };
        publish_all(&self.events, events).await;
        Ok(reply)
    }

    /// End the session from any non-terminal state
    pub async fn abandon(&self) -> NegotiationResult<()> {
        let mut events = Vec::new();
        {
            let mut session = self.session.lock().await;
            if session.state.is_terminal() {
                return Err(invalid_transition(&session, "abandon"));
            }
            session.transition(NegotiationState::Abandoned, &mut events);
            info!(session_id = %self.id, "Session abandoned");
        }
        publish_all(&self.events, events).await;
        Ok(())
    }

    // --- internals ---------------------------------------------------------

    /// Hand one invitation round to the sink without touching the session
    async fn deliver(
        &self,
        session: &NegotiationSession,
        proposal: &Proposal,
        round: u32,
    ) -> NegotiationResult<()> {
        let invitation = Invitation {
            title: session.title.clone(),
            host: session.host.clone(),
            attendees: session.attendees.to_vec(),
            proposal: proposal.clone(),
            round,
        };
        if self.sink.send(&invitation).await {
            Ok(())
        } else {
            warn!(session_id = %self.id, round, "Invitation sink refused delivery");
            Err(NegotiationError::InvitationRejected)
        }
    }

    /// Adopt `proposal`, reset every response to pending and start monitoring.
    /// Returns the notice appended to the transcript.
    fn start_round(
        &self,
        session: &mut NegotiationSession,
        proposal: Proposal,
        round: u32,
        events: &mut Vec<NegotiationEvent>,
    ) -> String {
        session.responses = ResponseMap::new_round(&session.attendees, round);
        session.proposal = Some(proposal.clone());
        session.alternative = None;
        let notice = notices::invitations_sent(&session.title, &proposal, &session.attendees);
        session.push_turn(Turn::system(notice.clone()), events);
        events.push(NegotiationEvent::InvitationsSent {
            session_id: self.id,
            round,
            proposal,
        });
        session.transition(NegotiationState::Monitoring, events);
        info!(session_id = %self.id, round, attendees = session.attendees.len(), "Invitations sent");
        notice
    }
}

/// Everything one conflict resolution needs, owned so it can run detached
/// from the caller that triggered it
struct ConflictRun {
    session_id: Uuid,
    session: Arc<Mutex<NegotiationSession>>,
    turn_slot: Arc<Semaphore>,
    directory: Arc<dyn DirectoryAdapter>,
    engine: ConflictResolutionEngine,
    events: NegotiationBus,
}

impl ConflictRun {
    async fn run(
        self,
        context: OracleContext,
        current: Proposal,
        declined: Attendee,
        round: u32,
    ) -> NegotiationResult<AlternativeCandidate> {
        let candidate = {
            // shares the oracle slot with host turns; waits rather than failing
            let _permit = self.turn_slot.acquire().await.ok();
            info!(session_id = %self.session_id, declined = %declined.email, round, "Resolving conflict");

            let busy = fetch_busy(self.directory.as_ref(), &context).await;
            let request = AlternativeRequest {
                title: context.title.clone(),
                attendees: context.with_busy(busy),
                current,
                declined,
            };
            self.engine.resolve(&request).await
        };

        let mut events = Vec::new();
        {
            let mut session = self.session.lock().await;
            if session.state != NegotiationState::Monitoring || session.round() != round {
                warn!(session_id = %self.session_id, state = %session.state, "Session moved on during conflict resolution");
                return Err(invalid_transition(&session, "record_response"));
            }
            session.push_turn(
                Turn::assistant(notices::alternative_offer(&candidate)),
                &mut events,
            );
            session.alternative = Some(candidate.clone());
            session.transition(NegotiationState::AlternativeProposed, &mut events);
            events.push(NegotiationEvent::AlternativeProposed {
                session_id: self.session_id,
                candidate: candidate.clone(),
            });
        }
        publish_all(&self.events, events).await;
        Ok(candidate)
    }
}

/// One lookup at a time, in roster order
async fn fetch_busy(
    directory: &dyn DirectoryAdapter,
    context: &OracleContext,
) -> Vec<Vec<BusyInterval>> {
    let timer = OperationTimer::new("directory.lookup_busy_intervals");
    let mut busy = Vec::with_capacity(context.attendees.len());
    for attendee in &context.attendees {
        busy.push(directory.lookup_busy_intervals(&attendee.email).await);
    }
    timer.finish();
    busy
}

fn require_setup(session: &NegotiationSession, operation: &'static str) -> NegotiationResult<()> {
    if session.state == NegotiationState::Setup {
        Ok(())
    } else {
        Err(invalid_transition(session, operation))
    }
}

fn invalid_transition(session: &NegotiationSession, operation: &'static str) -> NegotiationError {
    NegotiationError::InvalidTransition {
        state: session.state.to_string(),
        operation,
    }
}

fn host_reply(kind: ReplyKind, message: String, session: &NegotiationSession) -> HostReply {
    HostReply {
        kind,
        message,
        state: session.state.clone(),
        proposal: session.proposal.clone(),
    }
}
