//! Core logging types: directive results, status, and the [`Log`] trait.
use crate::plan::{Directive, Phase};

/// Outcome of a single directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveStatus {
    /// The directive changed the system.
    Applied,
    /// The system already matched; nothing was done.
    AlreadyCorrect,
    /// Dry-run mode; the change was only reported.
    DryRun,
    /// The directive failed; the run continued.
    FailedRecoverable,
    /// A required tool was missing; the run was aborted.
    FailedFatal,
}

/// Result recorded for one directive, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Phase the directive belongs to.
    pub phase: Phase,
    /// The directive itself.
    pub directive: Directive,
    /// Final status.
    pub status: DirectiveStatus,
    /// Optional detail (failure reason, skip reason).
    pub message: Option<String>,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) forwards to `tracing`; tests use a
/// capturing implementation so execution code can be checked without a
/// global subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}
