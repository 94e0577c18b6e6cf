use std::sync::Arc;

use crate::config::Config;
use crate::exec::Executor;
use crate::logging::Log;

/// Shared context for phase execution.
pub struct Context {
    /// Assembled configuration.
    pub config: Arc<Config>,
    /// Logger for output.
    pub log: Arc<dyn Log>,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Whether to preview changes without applying them.
    pub dry_run: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("log", &"<dyn Log>")
            .field("executor", &self.executor)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Context {
    /// Creates a new context; dry-run mode is taken from `config`.
    #[must_use]
    pub fn new(config: Arc<Config>, log: Arc<dyn Log>, executor: Arc<dyn Executor>) -> Self {
        let dry_run = config.dry_run;
        Self {
            config,
            log,
            executor,
            dry_run,
        }
    }
}
