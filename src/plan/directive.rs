//! Directive kinds and their payloads.
use std::fmt;
use std::path::{Path, PathBuf};

/// Package ecosystem an `install-package` directive targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ecosystem {
    /// Debian system packages via `apt-get`.
    Apt,
    /// Python packages via `pip`.
    Pip,
    /// Global Node packages via `npm`.
    Npm,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Pip => write!(f, "pip"),
            Self::Npm => write!(f, "npm"),
        }
    }
}

/// What an `install-package` directive installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageTarget {
    /// A single package, possibly with a version specifier (`requests>=2`).
    Name(String),
    /// A pip requirements file installed as one unit (`pip install -r`).
    Requirements(PathBuf),
}

/// Where a `run-script` directive's script comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// A script on the local filesystem.
    Path(PathBuf),
    /// A script downloaded over HTTP(S) before it runs.
    Url(String),
}

impl ScriptSource {
    /// Classify a raw value as a URL or a path.
    ///
    /// Returns `None` for empty or whitespace-only input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("https://") || raw.starts_with("http://") {
            Some(Self::Url(raw.to_string()))
        } else {
            Some(Self::Path(PathBuf::from(raw)))
        }
    }
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => write!(f, "{u}"),
        }
    }
}

/// A line a `set-env` directive adds to the shell-startup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSetting {
    /// `export KEY="value"`.
    Export {
        /// Variable name.
        key: String,
        /// Value, written verbatim between double quotes.
        value: String,
    },
    /// Source a file of exports when it exists.
    Source(PathBuf),
}

impl EnvSetting {
    /// The exact line appended to the shell-startup file.
    #[must_use]
    pub fn shell_line(&self) -> String {
        match self {
            Self::Export { key, value } => format!("export {key}=\"{value}\""),
            Self::Source(path) => {
                let p = path.display();
                format!("[ -f \"{p}\" ] && . \"{p}\"")
            }
        }
    }
}

/// A single atomic installation or configuration action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Install one package (or a requirements file) with an ecosystem's installer.
    InstallPackage {
        /// Ecosystem whose installer runs.
        ecosystem: Ecosystem,
        /// Package or requirements file.
        target: PackageTarget,
    },
    /// Clone a repository, or pull when the destination already holds a checkout.
    CloneRepo {
        /// Remote URL.
        url: String,
        /// Working-tree destination.
        dest: PathBuf,
    },
    /// Run a script with `bash`.
    RunScript(ScriptSource),
    /// Link `target` to `source`.
    Symlink {
        /// File inside the dotfiles source tree.
        source: PathBuf,
        /// Destination path under `$HOME`.
        target: PathBuf,
    },
    /// Append an environment line to the shell-startup file.
    SetEnv(EnvSetting),
}

impl Directive {
    /// Build a named package directive; blank names yield `None`.
    #[must_use]
    pub fn package(ecosystem: Ecosystem, name: &str) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self::InstallPackage {
            ecosystem,
            target: PackageTarget::Name(name.to_string()),
        })
    }

    /// One package directive per whitespace-separated token, in order.
    pub fn packages(ecosystem: Ecosystem, list: &str) -> impl Iterator<Item = Self> + '_ {
        list.split_whitespace()
            .filter_map(move |name| Self::package(ecosystem, name))
    }

    /// Build a clone directive; a blank URL yields `None`.
    #[must_use]
    pub fn clone_repo(url: &str, dest: &Path) -> Option<Self> {
        let url = url.trim();
        (!url.is_empty()).then(|| Self::CloneRepo {
            url: url.to_string(),
            dest: dest.to_path_buf(),
        })
    }

    /// Build a script directive; a blank value yields `None`.
    #[must_use]
    pub fn script(raw: &str) -> Option<Self> {
        ScriptSource::parse(raw).map(Self::RunScript)
    }

    /// Short kind label used in logs and rendered plans.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InstallPackage { .. } => "install-package",
            Self::CloneRepo { .. } => "clone-repo",
            Self::RunScript(_) => "run-script",
            Self::Symlink { .. } => "symlink",
            Self::SetEnv(_) => "set-env",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstallPackage {
                ecosystem,
                target: PackageTarget::Name(name),
            } => write!(f, "{name} ({ecosystem})"),
            Self::InstallPackage {
                ecosystem,
                target: PackageTarget::Requirements(path),
            } => write!(f, "-r {} ({ecosystem})", path.display()),
            Self::CloneRepo { url, dest } => write!(f, "{url} -> {}", dest.display()),
            Self::RunScript(source) => write!(f, "{source}"),
            Self::Symlink { source, target } => {
                write!(f, "{} -> {}", target.display(), source.display())
            }
            Self::SetEnv(setting) => write!(f, "{}", setting.shell_line()),
        }
    }
}
