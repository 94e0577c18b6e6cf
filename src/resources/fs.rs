//! File-system helpers shared by resources.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

/// Ensure the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Whether anything (including a dangling symlink) exists at `path`.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// First free `<name>.backup-<stamp>` sibling of `path`.
///
/// When that name is taken a numeric suffix is appended
/// (`<name>.backup-<stamp>.1`, `.2`, …).
#[must_use]
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    let base = path.with_file_name(format!("{name}.backup-{stamp}"));
    if !entry_exists(&base) {
        return base;
    }
    (1u32..)
        .map(|n| path.with_file_name(format!("{name}.backup-{stamp}.{n}")))
        .find(|candidate| !entry_exists(candidate))
        .unwrap_or(base)
}

/// Rename whatever lives at `path` to a fresh backup name, returning it.
///
/// # Errors
///
/// Returns an error if the rename fails.
pub fn move_to_backup(path: &Path, stamp: &str) -> Result<PathBuf> {
    let backup = backup_path(path, stamp);
    std::fs::rename(path, &backup)
        .with_context(|| format!("back up {} to {}", path.display(), backup.display()))?;
    Ok(backup)
}
