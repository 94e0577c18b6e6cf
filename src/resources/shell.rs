//! Shell-startup line resource.
use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A single line that must be present in a shell-startup file.
#[derive(Debug, Clone)]
pub struct ShellLineResource {
    /// Startup file, usually `~/.bashrc`.
    pub rc: PathBuf,
    /// Exact line to append.
    pub line: String,
}

impl ShellLineResource {
    /// Create a new shell-line resource.
    #[must_use]
    pub const fn new(rc: PathBuf, line: String) -> Self {
        Self { rc, line }
    }
}

impl Applicable for ShellLineResource {
    fn description(&self) -> String {
        format!("{} in {}", self.line, self.rc.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let existing = match std::fs::read_to_string(&self.rc) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", self.rc.display()));
            }
        };
        if existing.lines().any(|l| l == self.line) {
            return Ok(ResourceChange::AlreadyCorrect);
        }

        ensure_parent_dir(&self.rc)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.rc)
            .with_context(|| format!("open {}", self.rc.display()))?;
        let sep = if existing.is_empty() || existing.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        writeln!(file, "{sep}{}", self.line)
            .with_context(|| format!("append to {}", self.rc.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ShellLineResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.rc.exists() {
            return Ok(ResourceState::Missing);
        }
        let content = std::fs::read_to_string(&self.rc)
            .with_context(|| format!("read {}", self.rc.display()))?;
        if content.lines().any(|l| l == self.line) {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }
}
