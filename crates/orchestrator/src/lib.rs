//! Meeting negotiation orchestration
#![allow(clippy::uninlined_format_args)]
//!
//! This crate drives one meeting-scheduling session through its lifecycle:
//! host dialogue with the Reasoning Oracle, proposal preview, invitation
//! rounds, response tracking and conflict resolution.
//!
//! # Architecture
//!
//! - **Negotiator**: owns the session and is the only thing that mutates it
//! - **ResponseTracker**: applies RSVPs to the current round
//! - **ConflictResolutionEngine**: one alternative per mandatory decline, with a next-day fallback
//! - **NegotiationEvent**: every change, published on the negotiator's own bus
//!
//! # Usage
//!
//! ```no_run
//! use domain::{Attendee, Decision};
//! use orchestrator::{Negotiator, NegotiatorConfig};
//! # use std::sync::Arc;
//! # async fn run(
//! #     directory: Arc<dyn domain::DirectoryAdapter>,
//! #     oracle: Arc<dyn domain::ReasoningOracle>,
//! #     sink: Arc<dyn domain::InvitationSink>,
//! # ) -> anyhow::Result<()> {
//! let negotiator = Negotiator::new(directory, oracle, sink, NegotiatorConfig::default());
//! negotiator.set_host("host@wharton.upenn.edu").await?;
//! negotiator.set_title("Team Sync").await?;
//! negotiator
//!     .add_attendee(Attendee::new("Ash Rk", "ashrk@wharton.upenn.edu").critical())
//!     .await?;
//! negotiator.start_dialogue().await?;
//! negotiator.submit_turn("Monday afternoon, one hour").await?;
//! negotiator.confirm_and_send().await?;
//! negotiator
//!     .record_response("ashrk@wharton.upenn.edu", Decision::Accepted)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conflict;
pub mod events;
pub mod negotiator;
pub mod notices;
pub mod reliability;
pub mod session;
pub mod tracker;

pub use config::NegotiatorConfig;
pub use conflict::{fallback_candidate, next_day, ConflictResolutionEngine, FALLBACK_RATIONALE};
pub use events::{NegotiationBus, NegotiationEvent};
pub use negotiator::{HostReply, Negotiator, ReplyKind, ResponseOutcome};
pub use session::{NegotiationSession, NegotiationState, Resolution};
pub use tracker::{ResponseTracker, TrackerUpdate};
