//! Override-directory extension source (`~/.dotfiles-extra/`).
use std::path::{Path, PathBuf};

use crate::plan::Ecosystem;

/// Pip packages, one per line.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
/// Apt packages, one per line.
pub const APT_FILE: &str = "packages.txt";
/// Npm packages, one per line.
pub const NPM_FILE: &str = "npm-packages.txt";
/// Exports sourced from the shell-startup file.
pub const ENV_FILE: &str = "env.sh";
/// Script run after everything else in the directory.
pub const CUSTOM_FILE: &str = "custom.sh";

/// A recognized file found in the override directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideFile {
    /// A package list file and its parsed entries.
    Packages {
        /// Ecosystem the list belongs to.
        ecosystem: Ecosystem,
        /// Package names in file order.
        names: Vec<String>,
    },
    /// `env.sh`.
    Env(PathBuf),
    /// `custom.sh`.
    Custom(PathBuf),
}

/// Recognized files of an existing override directory, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideFiles {
    /// The directory that was scanned.
    pub dir: PathBuf,
    /// Recognized files in the order the directory listing produced them.
    pub entries: Vec<OverrideFile>,
    /// Problems reading individual files; these never abort the run.
    pub warnings: Vec<String>,
}

impl OverrideFiles {
    /// Scan `dir`, returning `None` when it does not exist.
    ///
    /// Unrecognized files are ignored. A recognized file that cannot be read
    /// is reported in [`warnings`](Self::warnings) and contributes nothing.
    #[must_use]
    pub fn load(dir: &Path) -> Option<Self> {
        if !dir.is_dir() {
            return None;
        }
        let mut files = Self {
            dir: dir.to_path_buf(),
            ..Self::default()
        };

        let listing = match std::fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(e) => {
                files
                    .warnings
                    .push(format!("cannot list {}: {e}", dir.display()));
                return Some(files);
            }
        };

        for entry in listing.flatten() {
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            let ecosystem = match name.as_str() {
                REQUIREMENTS_FILE => Ecosystem::Pip,
                APT_FILE => Ecosystem::Apt,
                NPM_FILE => Ecosystem::Npm,
                ENV_FILE => {
                    files.entries.push(OverrideFile::Env(path));
                    continue;
                }
                CUSTOM_FILE => {
                    files.entries.push(OverrideFile::Custom(path));
                    continue;
                }
                _ => continue,
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let (names, skipped) = parse_package_list(&content);
                    for line in skipped {
                        files.warnings.push(format!(
                            "{}: ignoring option line '{line}'",
                            path.display()
                        ));
                    }
                    files
                        .entries
                        .push(OverrideFile::Packages { ecosystem, names });
                }
                Err(e) => files
                    .warnings
                    .push(format!("cannot read {}: {e}", path.display())),
            }
        }
        Some(files)
    }
}

/// Parse a one-package-per-line list.
///
/// Blank lines and `#` comments (whole-line or after whitespace) are dropped.
/// Lines starting with `-` are installer options, not packages; they are
/// returned separately so the caller can warn about them.
#[must_use]
pub fn parse_package_list(content: &str) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut options = Vec::new();
    for raw in content.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('-') {
            options.push(line.to_string());
        } else {
            names.push(line.to_string());
        }
    }
    (names, options)
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    line.find(" #")
        .or_else(|| line.find("\t#"))
        .map_or(line, |idx| line.get(..idx).unwrap_or(line))
}
