pub mod chat;
pub mod config;
pub mod roster;

pub use chat::ChatCommand;
pub use config::ConfigCommand;
pub use roster::RosterCommand;
