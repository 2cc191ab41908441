use crate::config::AppConfig;
use crate::directory::StaticDirectory;
use anyhow::Result;
use clap::Args;
use console::style;
use domain::DirectoryAdapter;

#[derive(Debug, Clone, Default, Args)]
pub struct RosterCommand {
    /// Only show people whose name or email contains this
    #[arg(short, long)]
    pub search: Option<String>,
}

impl RosterCommand {
    pub async fn execute(&self, config: &AppConfig) -> Result<()> {
        let directory = StaticDirectory::new(config.roster.clone());
        let matches = directory
            .search(self.search.as_deref().unwrap_or_default())
            .await;
        if matches.is_empty() {
            println!("{}", style("No matching people").yellow());
            return Ok(());
        }

        for entry in matches {
            println!("{} <{}>", style(&entry.name).bold(), entry.email);
            for busy in directory.lookup_busy_intervals(&entry.email).await {
                println!(
                    "    busy {} {} - {}",
                    busy.day, busy.start_time, busy.end_time
                );
            }
        }
        Ok(())
    }
}
