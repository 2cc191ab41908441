use crate::config::{AppConfig, RosterEntry};
use crate::directory::StaticDirectory;
use crate::progress::{ProgressType, Spinner};
use crate::simulation::ResponseSimulator;
use crate::sink::ConsoleInvitationSink;
use anyhow::Result;
use clap::Args;
use common::EventEnvelope;
use console::style;
use domain::{Attendee, Decision, NegotiationError, Proposal, ResponseStatus, TurnRole};
use llm::{build_oracle, LlmSettings};
use orchestrator::{HostReply, NegotiationEvent, NegotiationState, Negotiator, ReplyKind};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Args)]
pub struct ChatCommand {
    /// Your email address
    #[arg(long)]
    pub host: Option<String>,

    /// Calendar event title
    #[arg(long)]
    pub title: Option<String>,

    /// Attendee emails (repeat or comma-separate)
    #[arg(long = "attendee", value_delimiter = ',')]
    pub attendees: Vec<String>,

    /// Attendees who must be able to attend
    #[arg(long = "required", value_delimiter = ',')]
    pub required: Vec<String>,

    /// Record responses by hand with /accept and /decline
    #[arg(long)]
    pub no_simulation: bool,

    /// Override the delay between simulated responses
    #[arg(long)]
    pub response_delay_ms: Option<u64>,

    /// Use the rule-based assistant even when an API key is configured
    #[arg(long)]
    pub offline: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        let settings = if self.offline {
            LlmSettings::rules()
        } else {
            LlmSettings::from_env()?
        };
        let oracle = build_oracle(&settings, &config.negotiation.default_location)?;
        let directory = Arc::new(StaticDirectory::new(config.roster.clone()));
        let negotiator = Arc::new(Negotiator::new(
            directory.clone(),
            oracle,
            Arc::new(ConsoleInvitationSink),
            config.negotiation.clone(),
        ));

        let mut simulation = config.simulation.clone();
        if let Some(delay) = self.response_delay_ms {
            simulation.response_delay_ms = delay;
        }
        let simulate = simulation.enabled && !self.no_simulation;
        let simulator = if simulate {
            Some(
                ResponseSimulator::new(negotiator.clone(), simulation)
                    .spawn()
                    .await,
            )
        } else {
            None
        };

        let mut session = ChatSession {
            negotiator: negotiator.clone(),
            directory,
            view: EventView::new(negotiator.subscribe_all()),
            input: BufReader::new(tokio::io::stdin()).lines(),
            simulate,
        };
        print_banner(&settings.backend_name());
        let result = session.run(self).await;

        if let Some(handle) = simulator {
            handle.abort();
        }
        result
    }
}

/// Local view of the session, driven only by the negotiator's events
struct EventView {
    rx: broadcast::Receiver<EventEnvelope<NegotiationEvent>>,
    state: NegotiationState,
}

impl EventView {
    fn new(rx: broadcast::Receiver<EventEnvelope<NegotiationEvent>>) -> Self {
        Self {
            rx,
            state: NegotiationState::Setup,
        }
    }

    fn apply(&mut self, event: NegotiationEvent, spinner: Option<&Spinner>) {
        match event {
            NegotiationEvent::TurnAppended { turn, .. } => {
                let line = match turn.role {
                    TurnRole::Host => return,
                    TurnRole::Assistant => {
                        format!("{} {}", style("OptiMeet:").green().bold(), turn.content)
                    }
                    TurnRole::System => format!("{} {}", style("•").cyan(), style(turn.content).dim()),
                };
                match spinner {
                    Some(spinner) => spinner.println(&line),
                    None => println!("{}", line),
                }
            }
            NegotiationEvent::StateChanged { to, .. } => {
                debug!(state = %to, "Session state changed");
                self.state = to;
            }
            _ => {}
        }
    }

    /// Print everything published so far
    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => self.apply(envelope.payload, None),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// Block until the current invitation round settles
    async fn wait_while_monitoring(&mut self) {
        let spinner = ProgressType::Waiting.start("Waiting for responses...");
        while self.state == NegotiationState::Monitoring {
            match self.rx.recv().await {
                Ok(envelope) => self.apply(envelope.payload, Some(&spinner)),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        spinner.finish_and_clear();
    }
}

struct ChatSession<R> {
    negotiator: Arc<Negotiator>,
    directory: Arc<StaticDirectory>,
    view: EventView,
    input: Lines<R>,
    simulate: bool,
}

impl<R: AsyncBufRead + Unpin> ChatSession<R> {
    async fn run(&mut self, args: &ChatCommand) -> Result<()> {
        if !self.setup(args).await? {
            return Ok(());
        }
        if let Err(e) = self.negotiator.start_dialogue().await {
            print_error(&e);
            return Err(e.into());
        }
        self.view.drain();

        loop {
            self.view.drain();
            if self.view.state == NegotiationState::Monitoring && self.simulate {
                self.view.wait_while_monitoring().await;
                continue;
            }
            if self.view.state.is_terminal() {
                self.print_summary().await;
                break;
            }

            let label = match self.view.state {
                NegotiationState::AlternativeProposed => "Reschedule? (yes/no)",
                NegotiationState::Monitoring => "Response (/accept or /decline <email>)",
                _ => "You",
            };
            let Some(line) = self.ask(label).await? else {
                close_session(&self.negotiator, "end of input").await;
                break;
            };
            if line.is_empty() {
                continue;
            }
            if matches!(line.as_str(), "exit" | "quit" | "/quit") {
                close_session(&self.negotiator, "exit").await;
                println!("{}", style("Session closed. Goodbye!").bright().bold());
                break;
            }
            self.handle_line(&line).await;
        }
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let result = match command {
            "/help" => {
                print_help();
                return;
            }
            "/status" => {
                self.print_status().await;
                return;
            }
            "/send" => {
                let spinner = ProgressType::Sending.start("Sending invitations...");
                let result = self.negotiator.confirm_and_send().await;
                spinner.finish_and_clear();
                result.map(|_| ())
            }
            "/accept" => self.record(rest, Decision::Accepted).await,
            "/decline" => self.record(rest, Decision::Declined).await,
            "/required" => self.negotiator.set_critical(rest, true).await,
            "/optional" => self.negotiator.set_critical(rest, false).await,
            _ if self.view.state == NegotiationState::AlternativeProposed => {
                self.negotiator.decide(line).await.map(|_| ())
            }
            _ => {
                let spinner = ProgressType::Thinking.start("Thinking...");
                let result = self.negotiator.submit_turn(line).await;
                spinner.finish_and_clear();
                result.map(|reply| {
                    self.view.drain();
                    print_preview(&reply);
                })
            }
        };
        if let Err(e) = result {
            print_error(&e);
        }
    }

    async fn record(&self, email: &str, decision: Decision) -> Result<(), NegotiationError> {
        self.negotiator
            .record_response(email, decision)
            .await
            .map(|outcome| debug!(?outcome, "Manual response recorded"))
    }

    async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{} ", style(format!("{}>", label)).bright().bold());
        std::io::stdout().flush()?;
        let line = self.input.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    /// Collect host, title and attendees; false when input ran out
    async fn setup(&mut self, args: &ChatCommand) -> Result<bool> {
        let mut host = args.host.clone();
        loop {
            let email = match host.take() {
                Some(email) => email,
                None => match self.ask("Your email").await? {
                    Some(email) => email,
                    None => return Ok(false),
                },
            };
            match self.negotiator.set_host(&email).await {
                Ok(()) => break,
                Err(e) => print_error(&e),
            }
        }

        let mut title = args.title.clone();
        loop {
            let text = match title.take() {
                Some(text) => text,
                None => match self.ask("Event title").await? {
                    Some(text) => text,
                    None => return Ok(false),
                },
            };
            match self.negotiator.set_title(&text).await {
                Ok(()) => break,
                Err(e) => print_error(&e),
            }
        }

        let invited = if args.attendees.is_empty() {
            match self.choose_attendees().await? {
                Some(invited) => invited,
                None => return Ok(false),
            }
        } else {
            args.attendees
                .iter()
                .map(|email| self.roster_entry(email))
                .collect()
        };

        let required: Vec<String> = if args.attendees.is_empty() && args.required.is_empty() {
            match self.choose_required(&invited).await? {
                Some(required) => required,
                None => return Ok(false),
            }
        } else {
            args.required.clone()
        };

        for entry in invited {
            let mut attendee = Attendee::new(entry.name.clone(), entry.email.clone());
            attendee.critical = required.iter().any(|r| attendee.matches(r));
            if let Err(e) = self.negotiator.add_attendee(attendee).await {
                print_error(&e);
            }
        }
        info!(session_id = %self.negotiator.id(), "Setup complete");
        Ok(true)
    }

    fn roster_entry(&self, email: &str) -> RosterEntry {
        self.directory.find(email).cloned().unwrap_or_else(|| RosterEntry {
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            busy: Vec::new(),
        })
    }

    async fn choose_attendees(&mut self) -> Result<Option<Vec<RosterEntry>>> {
        let roster = self.directory.entries().to_vec();
        for (i, entry) in roster.iter().enumerate() {
            println!("  {}. {} <{}>", i + 1, entry.name, entry.email);
        }
        loop {
            let Some(line) = self.ask("Invite (numbers, e.g. 1,3)").await? else {
                return Ok(None);
            };
            match parse_selection(&line, roster.len()) {
                Some(picked) if !picked.is_empty() => {
                    return Ok(Some(picked.into_iter().map(|i| roster[i].clone()).collect()))
                }
                _ => println!("{}", style("Please select at least one attendee").yellow()),
            }
        }
    }

    async fn choose_required(&mut self, invited: &[RosterEntry]) -> Result<Option<Vec<String>>> {
        for (i, entry) in invited.iter().enumerate() {
            println!("  {}. {}", i + 1, entry.name);
        }
        loop {
            let Some(line) = self.ask("Required (numbers, blank for none)").await? else {
                return Ok(None);
            };
            match parse_selection(&line, invited.len()) {
                Some(picked) => {
                    return Ok(Some(
                        picked.into_iter().map(|i| invited[i].email.clone()).collect(),
                    ))
                }
                None => println!("{}", style("Use numbers from the list above").yellow()),
            }
        }
    }

    async fn print_status(&self) {
        let session = self.negotiator.snapshot().await;
        println!("{} {}", style("State:").bold(), session.state);
        if let Some(proposal) = &session.proposal {
            println!("{} {}", style("Proposal:").bold(), describe(proposal));
        }
        for attendee in session.attendees.iter() {
            let status = session
                .responses
                .status(&attendee.email)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let tag = if attendee.critical { " (required)" } else { "" };
            println!("  {}{}: {}", attendee.name, tag, status);
        }
    }

    async fn print_summary(&self) {
        let session = self.negotiator.snapshot().await;
        if let (NegotiationState::Resolved(_), Some(proposal)) = (&session.state, &session.proposal)
        {
            println!();
            println!("{} {}", style("[✓] Final:").green().bold(), describe(proposal));
            let declined = session.responses.count(ResponseStatus::Declined);
            if declined > 0 {
                println!("    {} attendee(s) will not attend", declined);
            }
        }
    }
}

/// "1, 3" -> [0, 2]; blank -> []; anything out of range -> None
pub fn parse_selection(input: &str, len: usize) -> Option<Vec<usize>> {
    let mut picked = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part.parse().ok()?;
        if n == 0 || n > len {
            return None;
        }
        if !picked.contains(&(n - 1)) {
            picked.push(n - 1);
        }
    }
    Some(picked)
}

fn describe(proposal: &Proposal) -> String {
    format!(
        "{} for {} at {}{}",
        proposal.slot_label(),
        proposal.duration,
        proposal.location,
        if proposal.includes_zoom { " (+ Zoom)" } else { "" }
    )
}

fn print_preview(reply: &HostReply) {
    if reply.kind != ReplyKind::Proposal {
        return;
    }
    let Some(proposal) = &reply.proposal else {
        return;
    };
    println!("{} {}", style("Preview:").cyan().bold(), describe(proposal));
    if proposal.is_invitable() {
        println!(
            "{}",
            style("Type /send to send invitations, or keep chatting to adjust.").dim()
        );
    } else {
        println!(
            "{}",
            style("Not every required attendee can make this time; keep chatting to adjust.")
                .yellow()
        );
    }
}

fn print_error(error: &NegotiationError) {
    println!("{} {}", style("[!]").yellow().bold(), error.host_message());
}

fn print_banner(backend: &str) {
    println!();
    println!("{}", style("  OptiMeet").cyan().bold());
    println!("  {}", style(format!("Meeting negotiation assistant ({})", backend)).dim());
    println!();
}

fn print_help() {
    println!("  /send               send invitations for the previewed proposal");
    println!("  /status             show the proposal and responses");
    println!("  /required <email>   mark an attendee as required");
    println!("  /optional <email>   mark an attendee as optional");
    println!("  /accept <email>     record an acceptance");
    println!("  /decline <email>    record a decline");
    println!("  exit                abandon the session");
}

/// Abandon unless the session already ended; returns whether it was open
async fn close_session(negotiator: &Negotiator, reason: &'static str) -> bool {
    match negotiator.abandon().await {
        Ok(()) => true,
        Err(e) => {
            debug!(reason, error = %e, "Session not abandoned");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::RuleBasedOracle;
    use orchestrator::NegotiatorConfig;

    #[tokio::test]
    async fn test_close_session_twice_reports_closed() {
        let negotiator = Negotiator::new(
            Arc::new(StaticDirectory::new(Vec::new())),
            Arc::new(RuleBasedOracle::default()),
            Arc::new(ConsoleInvitationSink),
            NegotiatorConfig::default(),
        );

        assert!(close_session(&negotiator, "exit").await);
        assert_eq!(negotiator.state().await, NegotiationState::Abandoned);
        assert!(!close_session(&negotiator, "exit").await);
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1,3", 3), Some(vec![0, 2]));
        assert_eq!(parse_selection(" 2 , 2 ", 3), Some(vec![1]));
        assert_eq!(parse_selection("", 3), Some(vec![]));
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("0", 3), None);
        assert_eq!(parse_selection("one", 3), None);
    }
}
