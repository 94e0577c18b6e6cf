//! `dotfiles-install` entry point.
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use dotfiles_provision::cli::Cli;
use dotfiles_provision::commands::install;
use dotfiles_provision::config::{self, EnvExtensions};
use dotfiles_provision::error::{ConfigError, ProvisionError};
use dotfiles_provision::exec::SystemExecutor;
use dotfiles_provision::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let env: HashMap<String, String> = std::env::vars().collect();
    let verbose = cli.verbose || EnvExtensions::from_map(&env).verbose;
    let cache_dir = config::cache_dir(&env);
    let log_file = logging::init_subscriber(verbose, cache_dir.as_deref());
    let log = Arc::new(Logger::new(log_file));

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            let err = ProvisionError::from(ConfigError::WorkingDirectory(e.to_string()));
            log.error(&err.to_string());
            return ExitCode::FAILURE;
        }
    };

    match install::run(&env, &cli, &cwd, Arc::new(SystemExecutor), &log) {
        Ok(_) => ExitCode::SUCCESS,
        // Already reported by the summary.
        Err(ProvisionError::Fatal(_)) => ExitCode::FAILURE,
        Err(e) => {
            log.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
