use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use cli::commands::{ChatCommand, ConfigCommand, RosterCommand};
use cli::AppConfig;
use common::init_structured_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "optimeet")]
#[command(about = "Negotiate a meeting time with your attendees")]
#[command(version)]
struct Cli {
    /// Path to a configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a meeting interactively (default)
    Chat(ChatCommand),
    /// List people in the directory and when they are busy
    Roster(RosterCommand),
    /// Show or create the configuration file
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    match cli.verbose {
        0 => {}
        1 => config.logging.level = "info".to_string(),
        _ => config.logging.level = "debug".to_string(),
    }
    init_structured_logging(config.logging.clone())?;

    match cli.command {
        Some(Commands::Chat(cmd)) => cmd.execute(&config).await,
        Some(Commands::Roster(cmd)) => cmd.execute(&config).await,
        Some(Commands::Config(cmd)) => cmd.execute(&config).await,
        None => ChatCommand::default().execute(&config).await,
    }
}
