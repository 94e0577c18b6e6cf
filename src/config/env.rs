//! Environment-variable extension source.
//!
//! Reads a snapshot map rather than the live process environment so the
//! resolver can be exercised with arbitrary inputs.
use std::collections::HashMap;

/// Extra pip packages, whitespace separated.
pub const EXTRA_PIP: &str = "DOTFILES_EXTRA_PIP";
/// Extra apt packages, whitespace separated.
pub const EXTRA_APT: &str = "DOTFILES_EXTRA_APT";
/// Extra npm packages, whitespace separated.
pub const EXTRA_NPM: &str = "DOTFILES_EXTRA_NPM";
/// Repository URL to clone.
pub const CUSTOM_REPO: &str = "DOTFILES_CUSTOM_REPO";
/// Script path or URL to run.
pub const CUSTOM_SCRIPT: &str = "DOTFILES_CUSTOM_SCRIPT";
/// Skip the defaults phase.
pub const SKIP_DEFAULT: &str = "DOTFILES_SKIP_DEFAULT";
/// Verbose console output.
pub const VERBOSE: &str = "DOTFILES_VERBOSE";
/// Dotfiles source tree location.
pub const ROOT: &str = "DOTFILES_ROOT";
/// Override directory location.
pub const EXTRA_DIR: &str = "DOTFILES_EXTRA_DIR";

/// Values taken from `DOTFILES_*` variables.
///
/// Every field is empty / `false` when its variable is unset or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvExtensions {
    /// `DOTFILES_EXTRA_PIP`.
    pub extra_pip: String,
    /// `DOTFILES_EXTRA_APT`.
    pub extra_apt: String,
    /// `DOTFILES_EXTRA_NPM`.
    pub extra_npm: String,
    /// `DOTFILES_CUSTOM_REPO`.
    pub custom_repo: String,
    /// `DOTFILES_CUSTOM_SCRIPT`.
    pub custom_script: String,
    /// `DOTFILES_SKIP_DEFAULT`.
    pub skip_default: bool,
    /// `DOTFILES_VERBOSE`.
    pub verbose: bool,
}

impl EnvExtensions {
    /// Read recognized variables from `env`.
    #[must_use]
    pub fn from_map(env: &HashMap<String, String>) -> Self {
        let text = |key: &str| non_empty(env, key).unwrap_or_default().to_string();
        let flag = |key: &str| non_empty(env, key).is_some_and(parse_bool);
        Self {
            extra_pip: text(EXTRA_PIP),
            extra_apt: text(EXTRA_APT),
            extra_npm: text(EXTRA_NPM),
            custom_repo: text(CUSTOM_REPO),
            custom_script: text(CUSTOM_SCRIPT),
            skip_default: flag(SKIP_DEFAULT),
            verbose: flag(VERBOSE),
        }
    }
}

/// Trimmed value of `key`, or `None` when unset or blank.
#[must_use]
pub fn non_empty<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `true`, `1` and `yes` (any case) enable a flag; everything else disables it.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
