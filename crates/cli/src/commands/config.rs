use crate::config::{AppConfig, CONFIG_FILE_NAME};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Print the configuration in effect
    Show,

    /// Write a default configuration file
    Init {
        /// Where to write it
        #[arg(short, long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigSubcommand::Init { output, force } => {
                if output.exists() && !force {
                    bail!(
                        "{} already exists (use --force to overwrite)",
                        output.display()
                    );
                }
                let content = AppConfig::default().to_toml()?;
                std::fs::write(output, content)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                info!(path = %output.display(), "Configuration written");
                println!("Wrote {}", output.display());
                Ok(())
            }
        }
    }
}
