//! Script execution resource, with download-and-cache for remote scripts.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};

use super::fs::ensure_parent_dir;
use super::{Applicable, ResourceChange};
use crate::error::ResourceError;
use crate::exec::Executor;
use crate::plan::ScriptSource;

/// A script run once per invocation with `bash`.
///
/// Scripts are opaque, so this only implements [`Applicable`]: there is no
/// state to compare against and every run applies.
#[derive(Debug)]
pub struct ScriptResource<'a> {
    /// Where the script comes from.
    pub source: ScriptSource,
    /// Directory the script runs in.
    workdir: PathBuf,
    /// Directory downloaded scripts are cached in.
    cache_dir: PathBuf,
    executor: &'a dyn Executor,
}

impl<'a> ScriptResource<'a> {
    /// Create a new script resource.
    #[must_use]
    pub const fn new(
        source: ScriptSource,
        workdir: PathBuf,
        cache_dir: PathBuf,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            source,
            workdir,
            cache_dir,
            executor,
        }
    }

    /// Local file the script is run from, downloading it first for URLs.
    fn local_path(&self) -> Result<PathBuf> {
        match &self.source {
            ScriptSource::Path(path) => {
                if !path.is_file() {
                    return Err(ResourceError::NotFound(path.display().to_string()).into());
                }
                Ok(path.clone())
            }
            ScriptSource::Url(url) => {
                let dest = cached_script_path(&self.cache_dir, url);
                download(self.executor, url, &dest)?;
                Ok(dest)
            }
        }
    }
}

/// Cache location for a downloaded script: `<cache>/scripts/<sha256>.sh`.
#[must_use]
pub fn cached_script_path(cache_dir: &Path, url: &str) -> PathBuf {
    cache_dir
        .join("scripts")
        .join(format!("{}.sh", sha256_hex(url.as_bytes())))
}

/// Lowercase hex SHA-256 digest of `bytes`.
fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for b in &digest {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    hex
}

/// Fetch `url` into `dest` with curl, falling back to wget.
fn download(executor: &dyn Executor, url: &str, dest: &Path) -> Result<()> {
    ensure_parent_dir(dest)?;
    let out = dest.to_string_lossy().into_owned();
    if executor.which("curl") {
        executor.run("curl", &["-fsSL", "-o", out.as_str(), url])?;
    } else if executor.which("wget") {
        executor.run("wget", &["-qO", out.as_str(), url])?;
    } else {
        bail!("curl or wget is required to download {url}");
    }
    Ok(())
}

impl Applicable for ScriptResource<'_> {
    fn description(&self) -> String {
        self.source.to_string()
    }

    fn apply(&self) -> Result<ResourceChange> {
        let path = self.local_path()?;
        let path_str = path.to_string_lossy().into_owned();
        let result = self
            .executor
            .run_in(&self.workdir, "bash", &[path_str.as_str()])
            .with_context(|| format!("running {}", self.source))?;
        if !result.stdout.trim().is_empty() {
            tracing::debug!("{}: {}", self.source, result.stdout.trim());
        }
        Ok(ResourceChange::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn missing_local_script_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = MockExecutor::ok();
        let script = ScriptResource::new(
            ScriptSource::Path(tmp.path().join("missing.sh")),
            tmp.path().to_path_buf(),
            tmp.path().join("cache"),
            &executor,
        );
        let err = script.apply().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::NotFound(_))
        ));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn local_script_runs_with_bash() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.sh");
        std::fs::write(&path, "echo hi\n").unwrap();
        let executor = MockExecutor::ok();
        let script = ScriptResource::new(
            ScriptSource::Path(path.clone()),
            tmp.path().to_path_buf(),
            tmp.path().join("cache"),
            &executor,
        );
        assert_eq!(script.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(executor.calls(), vec![format!("bash {}", path.display())]);
    }

    #[test]
    fn url_script_is_downloaded_then_run() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join("cache");
        let url = "https://example.com/setup.sh";
        let executor = MockExecutor::ok().with_tools(&["curl", "bash"]);
        let script = ScriptResource::new(
            ScriptSource::Url(url.to_string()),
            tmp.path().to_path_buf(),
            cache.clone(),
            &executor,
        );
        script.apply().unwrap();

        let cached = cached_script_path(&cache, url);
        assert_eq!(
            executor.calls(),
            vec![
                format!("curl -fsSL -o {} {url}", cached.display()),
                format!("bash {}", cached.display()),
            ]
        );
    }

    #[test]
    fn wget_is_the_fallback_downloader() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = MockExecutor::ok().with_tools(&["wget"]);
        download(&executor, "https://example.com/a.sh", &tmp.path().join("a.sh")).unwrap();
        assert!(executor.calls()[0].starts_with("wget -qO "));
    }

    #[test]
    fn download_without_tools_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let executor = MockExecutor::ok().with_tools(&[]);
        assert!(download(&executor, "https://example.com/a.sh", &tmp.path().join("a.sh")).is_err());
    }

    #[test]
    fn cache_name_is_stable_sha256() {
        let path = cached_script_path(Path::new("/c"), "https://example.com/setup.sh");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name.len(), 64 + 3);
        assert!(name.ends_with(".sh"));
        assert_eq!(path, cached_script_path(Path::new("/c"), "https://example.com/setup.sh"));
        assert_eq!(path.parent().unwrap(), Path::new("/c/scripts"));
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
