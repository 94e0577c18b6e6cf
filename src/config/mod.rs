//! Layered configuration assembled once at the entry point.
//!
//! Sources, in increasing precedence: built-in [`defaults`], the environment
//! snapshot ([`env`]), the override directory ([`overrides`]) and command-line
//! flags. Nothing below this module reads the process environment.
pub mod defaults;
pub mod env;
pub mod overrides;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::error::ConfigError;

pub use env::EnvExtensions;
pub use overrides::{OverrideFile, OverrideFiles};

/// Extensions requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliExtensions {
    /// `--pip-requirements`, absolute.
    pub pip_requirements: Option<PathBuf>,
    /// `--apt-packages`, whitespace separated.
    pub apt_packages: String,
    /// `--npm-packages`, whitespace separated.
    pub npm_packages: String,
    /// `--post-script`, absolute.
    pub post_script: Option<PathBuf>,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dotfiles source tree.
    pub root: PathBuf,
    /// User home directory; symlink and clone destinations live here.
    pub home: PathBuf,
    /// Directory the command was invoked from.
    pub cwd: PathBuf,
    /// Override directory location (it may not exist).
    pub override_dir: PathBuf,
    /// Shell-startup file that receives `set-env` lines.
    pub shell_rc: PathBuf,
    /// Cache directory for downloaded scripts and the log file.
    pub cache_dir: PathBuf,
    /// Drop the `defaults` phase.
    pub skip_defaults: bool,
    /// Debug-level console output.
    pub verbose: bool,
    /// Report what would change without changing anything.
    pub dry_run: bool,
    /// Environment-variable extensions.
    pub env: EnvExtensions,
    /// Override-directory extensions; `None` when the directory is absent.
    pub overrides: Option<OverrideFiles>,
    /// Command-line extensions.
    pub cli: CliExtensions,
}

impl Config {
    /// Assemble the configuration from an environment snapshot, parsed
    /// arguments and the invocation directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOME` is unset or the dotfiles root does not exist.
    pub fn assemble(
        env: &HashMap<String, String>,
        cli: &Cli,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        let home = env::non_empty(env, "HOME")
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingHome)?;
        let absolute = |p: &Path| absolutize(cwd, p);

        let root = cli
            .root
            .clone()
            .or_else(|| env::non_empty(env, env::ROOT).map(PathBuf::from))
            .map_or_else(|| cwd.to_path_buf(), |p| absolute(&p));
        if !root.is_dir() {
            return Err(ConfigError::MissingRoot(root.display().to_string()));
        }

        let override_dir = cli
            .extra_dir
            .clone()
            .or_else(|| env::non_empty(env, env::EXTRA_DIR).map(PathBuf::from))
            .map_or_else(|| home.join(defaults::OVERRIDE_DIR_NAME), |p| absolute(&p));

        let cache_dir = cache_dir(env).ok_or(ConfigError::MissingHome)?;

        let env_ext = EnvExtensions::from_map(env);
        let overrides = OverrideFiles::load(&override_dir);

        Ok(Self {
            shell_rc: home.join(defaults::SHELL_RC),
            skip_defaults: cli.skip_defaults || env_ext.skip_default,
            verbose: cli.verbose || env_ext.verbose,
            dry_run: cli.dry_run,
            cli: CliExtensions {
                pip_requirements: cli.pip_requirements.as_deref().map(absolute),
                apt_packages: cli.apt_packages.clone().unwrap_or_default(),
                npm_packages: cli.npm_packages.clone().unwrap_or_default(),
                post_script: cli.post_script.as_deref().map(absolute),
            },
            root,
            home,
            cwd: cwd.to_path_buf(),
            override_dir,
            cache_dir,
            env: env_ext,
            overrides,
        })
    }

    /// Resolve a user-supplied path against the invocation directory.
    #[must_use]
    pub fn absolute(&self, path: &Path) -> PathBuf {
        absolutize(&self.cwd, path)
    }

    /// Non-fatal problems found while loading configuration.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        match &self.overrides {
            Some(o) => &o.warnings,
            None => &[],
        }
    }
}

/// `$XDG_CACHE_HOME/dotfiles`, or `$HOME/.cache/dotfiles`.
///
/// Returns `None` when neither variable is set.
#[must_use]
pub fn cache_dir(env: &HashMap<String, String>) -> Option<PathBuf> {
    env::non_empty(env, "XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| env::non_empty(env, "HOME").map(|h| Path::new(h).join(".cache")))
        .map(|dir| dir.join("dotfiles"))
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
