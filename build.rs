//! Build script: embeds the release version for log output.
use std::process::Command;

/// Version reported in logs: `DOTFILES_VERSION` when set by a release build,
/// otherwise `git describe` of the checkout.
fn version() -> Option<String> {
    if let Ok(version) = std::env::var("DOTFILES_VERSION") {
        return Some(version);
    }
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    if let Some(version) = version() {
        println!("cargo:rustc-env=DOTFILES_VERSION={version}");
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=DOTFILES_VERSION");
}
