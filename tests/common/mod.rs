// Shared helpers for integration tests.
//
// Provides a temporary workspace with separate home, dotfiles root and
// override directories, plus a builder for the environment snapshot the
// provisioner reads.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dotfiles_provision::cli::Cli;
use dotfiles_provision::commands::install;
use dotfiles_provision::config::Config;
use dotfiles_provision::exec::SystemExecutor;
use dotfiles_provision::logging::{Log, Logger};
use dotfiles_provision::phases::Report;

/// An isolated provisioning workspace backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `home/`   stands in for `$HOME`
/// - `root/`   dotfiles source tree
pub struct Workspace {
    tmp: tempfile::TempDir,
    env: HashMap<String, String>,
}

impl Workspace {
    /// Create an empty workspace with `HOME` pointing at `home/`.
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir(tmp.path().join("home")).expect("create home");
        std::fs::create_dir(tmp.path().join("root")).expect("create root");
        let mut env = HashMap::new();
        env.insert(
            "HOME".to_string(),
            tmp.path().join("home").display().to_string(),
        );
        Self { tmp, env }
    }

    /// Path to the temporary `$HOME`.
    pub fn home(&self) -> PathBuf {
        self.tmp.path().join("home")
    }

    /// Path to the dotfiles source tree.
    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("root")
    }

    /// Default override directory (`$HOME/.dotfiles-extra`).
    pub fn extra_dir(&self) -> PathBuf {
        self.home().join(".dotfiles-extra")
    }

    /// Add a dotfile with `content` to the source tree.
    pub fn with_dotfile(self, name: &str, content: &str) -> Self {
        std::fs::write(self.root().join(name), content).expect("write dotfile");
        self
    }

    /// Write `name` into the override directory, creating it on first use.
    pub fn with_override(self, name: &str, content: &str) -> Self {
        let dir = self.extra_dir();
        std::fs::create_dir_all(&dir).expect("create override dir");
        std::fs::write(dir.join(name), content).expect("write override file");
        self
    }

    /// Set an environment variable in the snapshot.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// The environment snapshot handed to the provisioner.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Parse `args` (without the program name) into a [`Cli`] rooted here.
    pub fn cli(&self, args: &[&str]) -> Cli {
        use clap::Parser as _;
        let root = self.root().display().to_string();
        let mut argv = vec!["dotfiles-install", "--root", root.as_str()];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    /// Assemble the configuration for `args`.
    pub fn config(&self, args: &[&str]) -> Config {
        Config::assemble(&self.env, &self.cli(args), self.tmp.path()).expect("assemble config")
    }

    /// Run the provisioner in-process with real processes and a silent logger.
    pub fn run(&self, args: &[&str]) -> Report {
        let log: Arc<dyn Log> = Arc::new(Logger::new(None));
        install::resolve_and_run(
            &self.env,
            &self.cli(args),
            self.tmp.path(),
            Arc::new(SystemExecutor),
            log,
        )
        .expect("run provisioner")
    }
}

/// Whether `path` is a symlink pointing at `source`.
pub fn links_to(path: &Path, source: &Path) -> bool {
    std::fs::read_link(path).is_ok_and(|dest| dest == source)
}
