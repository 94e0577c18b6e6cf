//! Command-line argument definitions.
use clap::Parser;
use std::path::PathBuf;

/// Command-line surface of the provisioner.
///
/// With no arguments it links dotfiles and installs the base configuration;
/// the extension flags layer extra packages and scripts on top.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "dotfiles-install",
    about = "Provision a development workspace from dotfiles and layered extensions",
    version
)]
pub struct Cli {
    /// Install Python packages from a requirements file
    #[arg(long, value_name = "FILE")]
    pub pip_requirements: Option<PathBuf>,

    /// Install extra system packages (space-separated list)
    #[arg(long, value_name = "PACKAGES")]
    pub apt_packages: Option<String>,

    /// Install extra global npm packages (space-separated list)
    #[arg(long, value_name = "PACKAGES")]
    pub npm_packages: Option<String>,

    /// Run a script after every other step
    #[arg(long, value_name = "FILE")]
    pub post_script: Option<PathBuf>,

    /// Skip the default packages and repository clone
    #[arg(long)]
    pub skip_defaults: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Override dotfiles root directory
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Override the extension directory (default ~/.dotfiles-extra)
    #[arg(long, value_name = "DIR")]
    pub extra_dir: Option<PathBuf>,
}
