//! Symlink resource with backup of whatever occupies the destination.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::fs::{ensure_parent_dir, entry_exists, move_to_backup};
use super::{Applicable, Resource, ResourceChange, ResourceState};

/// A symlink resource that can be checked and applied.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Apply using an explicit backup timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing entry cannot be moved aside or the
    /// link cannot be created.
    pub fn apply_with_stamp(&self, stamp: &str) -> Result<ResourceChange> {
        if matches!(self.current_state()?, ResourceState::Correct) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        ensure_parent_dir(&self.target)?;

        if entry_exists(&self.target) {
            let backup = move_to_backup(&self.target, stamp)?;
            tracing::debug!("backed up {} to {}", self.target.display(), backup.display());
        }

        create_symlink(&self.source, &self.target)
            .with_context(|| format!("create link: {}", self.target.display()))?;
        Ok(ResourceChange::Applied)
    }
}

/// Timestamp used in backup names: `YYYYMMDDHHMMSS`, local time.
#[must_use]
pub fn backup_stamp() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

impl Applicable for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        self.apply_with_stamp(&backup_stamp())
    }
}

impl Resource for SymlinkResource {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        match std::fs::read_link(&self.target) {
            Ok(existing) if existing == self.source => Ok(ResourceState::Correct),
            Ok(existing) => Ok(ResourceState::Incorrect {
                current: format!("points to {}", existing.display()),
            }),
            Err(_) if !entry_exists(&self.target) => Ok(ResourceState::Missing),
            Err(_) if self.target.is_dir() => Ok(ResourceState::Incorrect {
                current: "target is a directory".to_string(),
            }),
            Err(_) => Ok(ResourceState::Incorrect {
                current: "target is a regular file".to_string(),
            }),
        }
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link).with_context(|| {
        format!(
            "creating symlink {} -> {}",
            link.display(),
            target.display()
        )
    })?;

    #[cfg(windows)]
    std::os::windows::fs::symlink_file(target, link).with_context(|| {
        format!(
            "creating symlink {} -> {}",
            link.display(),
            target.display()
        )
    })?;

    Ok(())
}
