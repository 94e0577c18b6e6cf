//! End-to-end install: configuration, plan, execution and summary.
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ProvisionError;
use crate::exec::Executor;
use crate::logging::{Log, Logger};
use crate::phases::{self, Context, Report};
use crate::plan::Plan;

/// Assemble the configuration, resolve the plan and execute it.
///
/// A fatal phase failure is recorded in [`Report::fatal`] rather than
/// returned, so the caller can still summarise what ran.
///
/// # Errors
///
/// Returns [`ProvisionError::Config`] if the configuration cannot be
/// assembled; no directive runs in that case.
pub fn resolve_and_run(
    env: &HashMap<String, String>,
    cli: &Cli,
    cwd: &Path,
    executor: Arc<dyn Executor>,
    log: Arc<dyn Log>,
) -> Result<Report, ProvisionError> {
    let config = Config::assemble(env, cli, cwd)?;

    let version = option_env!("DOTFILES_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    log.info(&format!("dotfiles-install {version}"));
    log.debug(&format!("root: {}", config.root.display()));
    log.debug(&format!("home: {}", config.home.display()));
    log.debug(&format!("override dir: {}", config.override_dir.display()));

    for warning in config.warnings() {
        log.warn(warning);
    }

    let plan = Plan::resolve(&config);
    log.debug(&format!(
        "{} directives in {} phases",
        plan.len(),
        plan.phases().len()
    ));
    if config.dry_run {
        log.stage("Plan");
        for line in plan.render().lines() {
            log.info(line);
        }
    }

    let ctx = Context::new(Arc::new(config), log, executor);
    Ok(phases::execute(&plan, &ctx))
}

/// Run the installer end to end and print the summary.
///
/// # Errors
///
/// Returns an error for configuration problems or when a phase failed
/// fatally.
pub fn run(
    env: &HashMap<String, String>,
    cli: &Cli,
    cwd: &Path,
    executor: Arc<dyn Executor>,
    log: &Arc<Logger>,
) -> Result<Report, ProvisionError> {
    let report = resolve_and_run(env, cli, cwd, executor, Arc::clone(log) as Arc<dyn Log>)?;
    log.print_summary(&report);
    if let Some(fatal) = report.fatal.clone() {
        return Err(fatal.into());
    }
    Ok(report)
}
