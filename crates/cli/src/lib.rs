//! OptiMeet CLI
//!
//! Terminal front end for the negotiation core: configuration, the static
//! directory, console invitation delivery and simulated attendee responses.

pub mod commands;
pub mod config;
pub mod directory;
pub mod progress;
pub mod simulation;
pub mod sink;

pub use config::AppConfig;
pub use directory::StaticDirectory;
pub use simulation::ResponseSimulator;
pub use sink::ConsoleInvitationSink;
