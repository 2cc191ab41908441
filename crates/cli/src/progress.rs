use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Kinds of waits the CLI shows a spinner for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressType {
    /// Reasoning Oracle round trip
    Thinking,
    /// Invitation delivery
    Sending,
    /// Waiting on attendee responses
    Waiting,
}

impl ProgressType {
    fn tick_chars(self) -> &'static str {
        match self {
            ProgressType::Thinking => "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏",
            ProgressType::Sending => "⠋⠙⠚⠞⠖⠦⠴⠲⠳⠓",
            ProgressType::Waiting => "◐◓◑◒",
        }
    }

    fn tick_interval(self) -> Duration {
        match self {
            ProgressType::Thinking => Duration::from_millis(80),
            ProgressType::Sending => Duration::from_millis(120),
            ProgressType::Waiting => Duration::from_millis(200),
        }
    }

    /// Spinners are drawn only when stderr is a terminal
    pub fn start(self, message: &str) -> Spinner {
        let bar = if console::Term::stderr().is_term() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(spinner_style) = ProgressStyle::default_spinner()
            .tick_chars(self.tick_chars())
            .template("{spinner:.cyan} {msg}")
        {
            bar.set_style(spinner_style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(self.tick_interval());
        Spinner { bar }
    }
}

pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Print above the spinner without tearing it
    pub fn println(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
