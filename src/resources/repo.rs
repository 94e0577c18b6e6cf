//! Git checkout resource: clone once, fast-forward afterwards.
use std::path::PathBuf;

use anyhow::Result;

use super::fs::ensure_parent_dir;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// A repository checkout at `dest`.
#[derive(Debug)]
pub struct RepoResource<'a> {
    /// Remote URL.
    pub url: String,
    /// Working-tree destination.
    pub dest: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> RepoResource<'a> {
    /// Create a new repository resource.
    #[must_use]
    pub const fn new(url: String, dest: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            url,
            dest,
            executor,
        }
    }

    fn is_checkout(&self) -> bool {
        self.dest.join(".git").exists()
    }
}

impl Applicable for RepoResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.url, self.dest.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        let dest = self.dest.to_string_lossy().into_owned();
        if self.is_checkout() {
            self.executor
                .run("git", &["-C", dest.as_str(), "pull", "--ff-only"])?;
        } else {
            ensure_parent_dir(&self.dest)?;
            self.executor
                .run("git", &["clone", self.url.as_str(), dest.as_str()])?;
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for RepoResource<'_> {
    /// An existing checkout is reported as `Incorrect` so it gets pulled.
    fn current_state(&self) -> Result<ResourceState> {
        if self.is_checkout() {
            return Ok(ResourceState::Incorrect {
                current: "existing checkout".to_string(),
            });
        }
        if !self.dest.exists() {
            return Ok(ResourceState::Missing);
        }
        let occupied = self.dest.is_file() || std::fs::read_dir(&self.dest)?.next().is_some();
        if occupied {
            Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a git checkout", self.dest.display()),
            })
        } else {
            Ok(ResourceState::Missing)
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    const URL: &str = "https://github.com/tmux-plugins/tpm";

    #[test]
    fn missing_destination_is_cloned() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("plugins/tpm");
        let executor = MockExecutor::ok();
        let repo = RepoResource::new(URL.to_string(), dest.clone(), &executor);

        assert_eq!(repo.current_state().unwrap(), ResourceState::Missing);
        repo.apply().unwrap();
        assert_eq!(
            executor.calls(),
            vec![format!("git clone {URL} {}", dest.display())]
        );
        assert!(tmp.path().join("plugins").is_dir());
    }

    #[test]
    fn existing_checkout_is_pulled() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        let executor = MockExecutor::ok();
        let repo = RepoResource::new(URL.to_string(), tmp.path().to_path_buf(), &executor);

        assert!(matches!(
            repo.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
        repo.apply().unwrap();
        assert_eq!(
            executor.calls(),
            vec![format!("git -C {} pull --ff-only", tmp.path().display())]
        );
    }

    #[test]
    fn empty_directory_is_cloneable() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = MockExecutor::ok();
        let repo = RepoResource::new(URL.to_string(), tmp.path().to_path_buf(), &executor);
        assert_eq!(repo.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn populated_non_checkout_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("README"), "hi").unwrap();
        let executor = MockExecutor::ok();
        let repo = RepoResource::new(URL.to_string(), tmp.path().to_path_buf(), &executor);
        assert!(matches!(
            repo.current_state().unwrap(),
            ResourceState::Invalid { .. }
        ));
    }

    #[test]
    fn clone_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = MockExecutor::with_responses(vec![(false, String::new())]);
        let repo = RepoResource::new(URL.to_string(), tmp.path().join("x"), &executor);
        assert!(repo.apply().is_err());
    }
}
