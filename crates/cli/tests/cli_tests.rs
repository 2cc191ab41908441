use assert_cmd::Command;
use cli::AppConfig;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const ATTENDEES: &str = "gayatri1@wharton.upenn.edu,dadhania@wharton.upenn.edu,ashrk@wharton.upenn.edu";
const REQUIRED: &str = "gayatri1@wharton.upenn.edu,ashrk@wharton.upenn.edu";

fn default_config(dir: &TempDir) -> anyhow::Result<PathBuf> {
    let path = dir.path().join("optimeet.toml");
    std::fs::write(&path, AppConfig::default().to_toml()?)?;
    Ok(path)
}

fn optimeet(config: &PathBuf) -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("optimeet")?;
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    Ok(cmd)
}

fn chat(config: &PathBuf, extra: &[&str]) -> anyhow::Result<Command> {
    let mut cmd = optimeet(config)?;
    cmd.args([
        "chat",
        "--offline",
        "--host",
        "host@wharton.upenn.edu",
        "--title",
        "Team Sync",
        "--attendee",
        ATTENDEES,
        "--required",
        REQUIRED,
    ])
    .args(extra);
    Ok(cmd)
}

#[test]
fn roster_lists_directory() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    optimeet(&config)?
        .arg("roster")
        .assert()
        .success()
        .stdout(predicate::str::contains("Gayatri Sriram"))
        .stdout(predicate::str::contains("busy Wednesday 10:00 AM - 11:30 AM"));
    Ok(())
}

#[test]
fn roster_search_filters() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    optimeet(&config)?
        .args(["roster", "--search", "manan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dadhania@wharton.upenn.edu"))
        .stdout(predicate::str::contains("Ash Rk").not());
    Ok(())
}

#[test]
fn config_init_refuses_to_overwrite() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    let output = dir.path().join("generated.toml");

    optimeet(&config)?
        .args(["config", "init", "--output"])
        .arg(&output)
        .assert()
        .success();
    assert!(std::fs::read_to_string(&output)?.contains("[negotiation]"));

    optimeet(&config)?
        .args(["config", "init", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    Ok(())
}

#[test]
fn config_show_reflects_file() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[negotiation]\ndefault_location = \"Steinberg Hall\"\n")?;

    optimeet(&path)?
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Steinberg Hall"))
        .stdout(predicate::str::contains("oracle_timeout_secs = 30"));
    Ok(())
}

#[test]
fn chat_resolves_when_everyone_accepts() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    chat(&config, &["--no-simulation"])?
        .write_stdin(
            "Monday afternoon for 1 hour\n\
             /send\n\
             /accept gayatri1@wharton.upenn.edu\n\
             /accept dadhania@wharton.upenn.edu\n\
             /accept ashrk@wharton.upenn.edu\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("How about Monday at 12:00 PM"))
        .stdout(predicate::str::contains("Invitation #1: Team Sync"))
        .stdout(predicate::str::contains("Everyone has responded"));
    Ok(())
}

#[test]
fn chat_locks_in_original_after_decline() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    chat(&config, &["--no-simulation"])?
        .write_stdin(
            "Monday afternoon for 1 hour\n\
             /send\n\
             /decline ashrk@wharton.upenn.edu\n\
             no\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("Ash Rk can't make it"))
        .stdout(predicate::str::contains(
            "Keeping Monday at 12:00 PM. Ash Rk won't be able to attend.",
        ));
    Ok(())
}

#[test]
fn chat_reschedules_with_simulated_responses() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    chat(&config, &["--response-delay-ms", "0"])?
        .write_stdin("Monday afternoon for 1 hour\n/send\nyes\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Rescheduled to Monday at 3:00 PM"))
        .stdout(predicate::str::contains("Invitation #2: Team Sync"))
        .stdout(predicate::str::contains("Everyone has responded"));
    Ok(())
}

#[test]
fn chat_without_attendees_reprompts_then_quits() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = default_config(&dir)?;
    optimeet(&config)?
        .args(["chat", "--offline", "--host", "host@wharton.upenn.edu", "--title", "Sync"])
        .write_stdin("9\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Please select at least one attendee"));
    Ok(())
}
