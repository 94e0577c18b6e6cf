//! Built-in base configuration, the lowest-precedence layer.
use std::path::Path;

use crate::plan::{Directive, Ecosystem, EnvSetting};

/// Dotfiles linked from the source tree into `$HOME` when present.
pub const KNOWN_DOTFILES: &[&str] = &[
    ".bash_aliases",
    ".gitconfig",
    ".inputrc",
    ".tmux.conf",
    ".vimrc",
    ".zshrc",
];

/// System packages installed by the base configuration.
pub const APT_PACKAGES: &[&str] = &["git", "curl", "jq", "ripgrep", "tmux"];

/// Browser-automation library.
pub const PIP_PACKAGES: &[&str] = &["playwright"];

/// Command-line tool.
pub const NPM_PACKAGES: &[&str] = &["tldr"];

/// Repository cloned by the base configuration.
pub const DEFAULT_REPO_URL: &str = "https://github.com/tmux-plugins/tpm";

/// Destination of [`DEFAULT_REPO_URL`], relative to `$HOME`.
pub const DEFAULT_REPO_DEST: &str = ".tmux/plugins/tpm";

/// Override directory name under `$HOME`.
pub const OVERRIDE_DIR_NAME: &str = ".dotfiles-extra";

/// Destination of `DOTFILES_CUSTOM_REPO`, relative to `$HOME`.
pub const CUSTOM_REPO_DEST: &str = ".dotfiles-custom";

/// Shell-startup file, relative to `$HOME`.
pub const SHELL_RC: &str = ".bashrc";

/// Directives of the `defaults` phase, in execution order.
#[must_use]
pub fn directives(home: &Path) -> Vec<Directive> {
    let packages = [
        (Ecosystem::Apt, APT_PACKAGES),
        (Ecosystem::Pip, PIP_PACKAGES),
        (Ecosystem::Npm, NPM_PACKAGES),
    ];
    let mut out: Vec<Directive> = packages
        .iter()
        .flat_map(|(eco, names)| names.iter().filter_map(|n| Directive::package(*eco, n)))
        .collect();
    out.extend(Directive::clone_repo(
        DEFAULT_REPO_URL,
        &home.join(DEFAULT_REPO_DEST),
    ));
    out.push(Directive::SetEnv(EnvSetting::Export {
        key: "PATH".to_string(),
        value: "$HOME/.local/bin:$PATH".to_string(),
    }));
    out
}
