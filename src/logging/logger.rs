//! Structured logger with dry-run awareness and the end-of-run summary.
use std::path::PathBuf;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::Log;
use crate::phases::{PhaseOutcome, Report};

/// Implement the methods of [`Log`] by delegating to inherent methods of the
/// same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Logger backed by the global `tracing` subscriber.
///
/// Every message also reaches the persistent log file written by the
/// [`FileLayer`](super::subscriber::FileLayer), regardless of the verbose
/// flag. The logger only remembers the file's path for the summary.
#[derive(Debug, Default)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger that reports `log_file` in its summary.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Print the end-of-run summary for `report`.
    #[allow(clippy::print_stdout)]
    pub fn print_summary(&self, report: &Report) {
        println!();
        self.stage("Summary");
        for line in summary_lines(report) {
            self.info(&line);
        }
        if let Some(fatal) = &report.fatal {
            self.error(&format!("aborted: {fatal}"));
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);
}

/// Render the per-phase lines of the summary.
pub(super) fn summary_lines(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();
    for record in &report.phases {
        let line = match &record.outcome {
            PhaseOutcome::Ran => {
                let c = report.counts(record.phase);
                let (icon, color) = if c.failed > 0 {
                    ("✗", "\x1b[31m")
                } else {
                    ("✓", "\x1b[32m")
                };
                format!(
                    "{color}{icon}\x1b[0m {}: {} applied, {} ok, {} dry-run, {} failed",
                    record.phase, c.applied, c.already_ok, c.dry_run, c.failed
                )
            }
            PhaseOutcome::Skipped(reason) => {
                format!("\x1b[2m· {}: skipped ({reason})\x1b[0m", record.phase)
            }
            PhaseOutcome::Fatal => format!("\x1b[31m✗ {}: fatal\x1b[0m", record.phase),
            PhaseOutcome::NotRun => {
                format!("\x1b[2m· {}: not run (aborted)\x1b[0m", record.phase)
            }
        };
        lines.push(line);
    }

    for failed in report.failures() {
        let reason = failed.message.as_deref().unwrap_or("failed");
        lines.push(format!(
            "\x1b[31m  ✗ [{}] {}: {reason}\x1b[0m",
            failed.phase, failed.directive
        ));
    }

    let total = report.total();
    lines.push(format!(
        "{} directives: \x1b[32m{} applied\x1b[0m, {} ok, \x1b[37m{} dry-run\x1b[0m, \x1b[31m{} failed\x1b[0m",
        report.results.len(),
        total.applied,
        total.already_ok,
        total.dry_run,
        total.failed
    ));
    lines
}
