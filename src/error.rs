//! Domain-specific error types for the provisioner.
//!
//! Internal modules return typed errors while the binary entry point maps
//! them to an exit status. Recoverable per-directive failures never surface
//! here: they are captured as [`DirectiveStatus::FailedRecoverable`] results.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Config(ConfigError)      environment / working directory problems
//! └── Fatal(FatalError)        a phase cannot run at all
//!
//! ResourceError                typed recoverable failures inside a directive
//! ```
//!
//! [`DirectiveStatus::FailedRecoverable`]: crate::logging::DirectiveStatus::FailedRecoverable

use thiserror::Error;

use crate::plan::Phase;

/// Top-level error type returned by [`resolve_and_run`](crate::commands::install::resolve_and_run).
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration could not be assembled; no directive was attempted.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A phase could not run and the remaining plan was abandoned.
    #[error("Fatal error: {0}")]
    Fatal(#[from] FatalError),
}

/// Errors that arise while assembling the layered configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `HOME` is not present in the environment snapshot.
    #[error("HOME environment variable is not set")]
    MissingHome,

    /// The dotfiles source tree does not exist.
    #[error("dotfiles root does not exist: {0}")]
    MissingRoot(String),

    /// The invocation directory could not be determined.
    #[error("cannot read working directory: {0}")]
    WorkingDirectory(String),
}

/// Errors that abort the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    /// A tool required by every directive of some kind in the phase is absent
    /// and has no fallback.
    #[error("phase '{phase}' requires '{tool}' but it was not found on PATH")]
    MissingTool {
        /// Phase that could not start.
        phase: Phase,
        /// Name of the missing tool (or fallback chain).
        tool: String,
    },
}

/// Errors that arise from resource checks and apply operations.
///
/// These are always recoverable: the runner records them against the
/// directive and continues with the next one.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A command invoked by a resource failed with a non-zero exit code.
    #[error("command '{program}' failed (exit {exit_code}): {stderr}")]
    ExecutionFailed {
        /// Name of the program that was invoked.
        program: String,
        /// Exit code returned by the process.
        exit_code: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// A file referenced by a directive does not exist.
    #[error("file not found: {0}")]
    NotFound(String),
}
