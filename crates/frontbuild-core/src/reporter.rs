//! Human-readable progress banners.
//!
//! Banners are rendered to strings first ([`render_phase`], [`render_confirm`],
//! [`render_finish`]) and then written by the reporter.

use std::io::{Stdout, Write};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::pipeline::BuildOutcome;

const RULE: &str = "===============================================================";

/// Observer for pipeline progress.
///
/// Reporters only observe; they never influence control flow.
pub trait Reporter: Send + Sync {
    /// Banner printed before a phase starts.
    fn phase(&self, title: &str);

    /// Single-line confirmation printed after a phase succeeds.
    fn confirm(&self, message: &str);

    /// Terminal banner.
    fn finish(&self, outcome: &BuildOutcome);
}

/// Blank line, title, `=` rule.
pub fn render_phase(title: &str) -> String {
    format!("\n{}\n{}\n", title, RULE)
}

pub fn render_confirm(message: &str) -> String {
    format!(">>> {}\n", message)
}

/// The closing banner; a failure repeats its reason first.
pub fn render_finish(outcome: &BuildOutcome) -> String {
    match outcome {
        BuildOutcome::Success => "\n\\o/ BUILD COMPLETE \\o/\n".to_string(),
        BuildOutcome::Failure { reason, .. } => {
            format!("\n>>> {}\n/o\\ BUILD FAILED /o\\\n", reason)
        }
    }
}

/// Reporter writing banners to a terminal, stdout by default.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write + Send = Stdout> {
    out: Mutex<W>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_output(std::io::stdout())
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn with_output(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Give back the writer, e.g. a buffer under test.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, text: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A closed stdout must not fail the build.
        let _ = out.write_all(text.as_bytes()).and_then(|_| out.flush());
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn phase(&self, title: &str) {
        info!(event = "report.phase", title = %title);
        self.emit(&render_phase(title));
    }

    fn confirm(&self, message: &str) {
        info!(event = "report.confirm", message = %message);
        self.emit(&render_confirm(message));
    }

    fn finish(&self, outcome: &BuildOutcome) {
        match outcome {
            BuildOutcome::Success => info!(event = "report.finish", status = "success"),
            BuildOutcome::Failure { reason, .. } => {
                warn!(event = "report.finish", status = "failure", reason = %reason)
            }
        }
        self.emit(&render_finish(outcome));
    }
}
