//! Package installation resource for apt, pip and npm.
use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::error::ResourceError;
use crate::exec::Executor;
use crate::plan::{Ecosystem, PackageTarget};

/// Resolved command line used to install packages for one ecosystem.
///
/// `program` followed by `prefix` is run with the package name (or
/// `-r <file>`) appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installer {
    /// Executable to spawn.
    pub program: String,
    /// Arguments that precede the package name.
    pub prefix: Vec<String>,
    /// Arguments that list what is installed, run against `program`.
    query: Vec<String>,
}

impl Installer {
    /// Locate an installer for `ecosystem` on `PATH`.
    ///
    /// pip falls back from `pip3` to `pip` to `python3 -m pip`. apt runs
    /// through `sudo` when it is available.
    #[must_use]
    pub fn resolve(ecosystem: Ecosystem, executor: &dyn Executor) -> Option<Self> {
        match ecosystem {
            Ecosystem::Apt => {
                if !executor.which("apt-get") {
                    return None;
                }
                let program = if executor.which("sudo") { "sudo" } else { "env" };
                let mut prefix = Vec::new();
                if program == "sudo" {
                    prefix.push("env".to_string());
                }
                prefix.extend(
                    ["DEBIAN_FRONTEND=noninteractive", "apt-get", "install", "-y"]
                        .map(String::from),
                );
                Some(Self {
                    program: program.to_string(),
                    prefix,
                    query: Vec::new(),
                })
            }
            Ecosystem::Pip => {
                let (program, base): (&str, &[&str]) = if executor.which("pip3") {
                    ("pip3", &[])
                } else if executor.which("pip") {
                    ("pip", &[])
                } else if executor.which("python3") {
                    ("python3", &["-m", "pip"])
                } else {
                    return None;
                };
                let with = |tail: &[&str]| {
                    base.iter()
                        .chain(tail)
                        .map(|s| (*s).to_string())
                        .collect::<Vec<_>>()
                };
                Some(Self {
                    program: program.to_string(),
                    prefix: with(&["install"]),
                    query: with(&["list", "--format=freeze"]),
                })
            }
            Ecosystem::Npm => executor.which("npm").then(|| Self {
                program: "npm".to_string(),
                prefix: vec!["install".to_string(), "-g".to_string()],
                query: ["ls", "-g", "--depth=0", "--parseable"]
                    .map(String::from)
                    .to_vec(),
            }),
        }
    }

    /// Tool name reported when no installer can be found.
    #[must_use]
    pub const fn required_tool(ecosystem: Ecosystem) -> &'static str {
        match ecosystem {
            Ecosystem::Apt => "apt-get",
            Ecosystem::Pip => "pip3 (or pip, or python3 -m pip)",
            Ecosystem::Npm => "npm",
        }
    }

    fn install(&self, executor: &dyn Executor, tail: &[&str]) -> Result<()> {
        let mut args: Vec<&str> = self.prefix.iter().map(String::as_str).collect();
        args.extend_from_slice(tail);
        executor.run(&self.program, &args)?;
        Ok(())
    }
}

/// Refresh the apt package index.
///
/// # Errors
///
/// Returns an error if `apt-get update` fails.
pub fn apt_update(executor: &dyn Executor) -> Result<()> {
    if executor.which("sudo") {
        executor.run("sudo", &["apt-get", "update"])?;
    } else {
        executor.run("apt-get", &["update"])?;
    }
    Ok(())
}

/// Comparison key for a package name within its ecosystem.
///
/// Version specifiers are dropped; pip names are normalized the way pip
/// compares them (case-insensitive, `_` and `.` equal to `-`).
#[must_use]
pub fn package_key(ecosystem: Ecosystem, raw: &str) -> String {
    let raw = raw.trim();
    match ecosystem {
        Ecosystem::Pip => {
            let end = raw
                .find(|c: char| "=<>!~;[ @".contains(c))
                .unwrap_or(raw.len());
            raw.get(..end)
                .unwrap_or(raw)
                .to_ascii_lowercase()
                .replace(['_', '.'], "-")
        }
        Ecosystem::Npm => {
            // `@scope/name@1.2` keeps its leading `@`.
            let search_from = usize::from(raw.starts_with('@'));
            raw.get(search_from..)
                .and_then(|rest| rest.find('@'))
                .and_then(|at| raw.get(..at + search_from))
                .unwrap_or(raw)
                .to_string()
        }
        Ecosystem::Apt => raw.split('=').next().unwrap_or(raw).to_string(),
    }
}

/// Query the set of installed package keys for an ecosystem.
///
/// Runs a **single** listing command. A failing query yields an empty set so
/// every package is treated as missing.
///
/// # Errors
///
/// Returns an error if the listing command cannot be spawned.
pub fn get_installed_packages(
    ecosystem: Ecosystem,
    installer: &Installer,
    executor: &dyn Executor,
) -> Result<HashSet<String>> {
    let result = match ecosystem {
        Ecosystem::Apt => executor.run_unchecked(
            "dpkg-query",
            &["-W", "-f=${db:Status-Abbrev} ${Package}\n"],
        )?,
        Ecosystem::Pip | Ecosystem::Npm => {
            let args: Vec<&str> = installer.query.iter().map(String::as_str).collect();
            executor.run_unchecked(&installer.program, &args)?
        }
    };
    if !result.success {
        return Ok(HashSet::new());
    }
    Ok(parse_installed(ecosystem, &result.stdout))
}

fn parse_installed(ecosystem: Ecosystem, stdout: &str) -> HashSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| match ecosystem {
            Ecosystem::Apt => parse_dpkg_line(line),
            Ecosystem::Pip => Some(package_key(Ecosystem::Pip, line)),
            Ecosystem::Npm => line
                .rsplit_once("node_modules/")
                .map(|(_, name)| name.to_string()),
        })
        .collect()
}

/// Package name from a `<status> <package>[:arch]` line, or `None` unless
/// the package is actually installed.
///
/// The second status letter is the current state; anything other than `i`
/// (removed with config files left, half-installed, ...) still needs an install.
fn parse_dpkg_line(line: &str) -> Option<String> {
    let (status, package) = line.split_once(char::is_whitespace)?;
    if status.chars().nth(1) != Some('i') {
        return None;
    }
    package
        .trim()
        .split(':')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Whether `raw` asks for a particular version (`black==24.1`, `typescript@5`,
/// `htop=3.2-1`).
///
/// The installed sets only record names, so a pinned request can never be
/// proven satisfied from them.
#[must_use]
pub fn has_version_constraint(ecosystem: Ecosystem, raw: &str) -> bool {
    let raw = raw.trim();
    match ecosystem {
        Ecosystem::Pip => raw.contains(|c: char| "=<>!~@".contains(c)),
        Ecosystem::Npm => raw.strip_prefix('@').unwrap_or(raw).contains('@'),
        Ecosystem::Apt => raw.contains('='),
    }
}

/// A package (or requirements file) that can be checked and installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Ecosystem the package belongs to.
    pub ecosystem: Ecosystem,
    /// Package name or requirements file.
    pub target: PackageTarget,
    installer: &'a Installer,
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(
        ecosystem: Ecosystem,
        target: PackageTarget,
        installer: &'a Installer,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            ecosystem,
            target,
            installer,
            executor,
        }
    }

    /// Key recorded in the installed set after a successful install.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match &self.target {
            PackageTarget::Name(name) => Some(package_key(self.ecosystem, name)),
            PackageTarget::Requirements(_) => None,
        }
    }

    /// Determine the resource state from a pre-fetched installed set.
    ///
    /// Requirements files and version-pinned names are always reported as
    /// missing; the installer itself skips what is already satisfied.
    #[must_use]
    pub fn state_from_installed(&self, installed: &HashSet<String>) -> ResourceState {
        match &self.target {
            PackageTarget::Name(name)
                if !has_version_constraint(self.ecosystem, name)
                    && installed.contains(&package_key(self.ecosystem, name)) =>
            {
                ResourceState::Correct
            }
            _ => ResourceState::Missing,
        }
    }

    fn requirements_file(&self) -> Option<&PathBuf> {
        match &self.target {
            PackageTarget::Requirements(path) => Some(path),
            PackageTarget::Name(_) => None,
        }
    }
}

impl Applicable for PackageResource<'_> {
    fn description(&self) -> String {
        match &self.target {
            PackageTarget::Name(name) => format!("{name} ({})", self.ecosystem),
            PackageTarget::Requirements(path) => {
                format!("-r {} ({})", path.display(), self.ecosystem)
            }
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        match &self.target {
            PackageTarget::Name(name) => self.installer.install(self.executor, &[name.as_str()])?,
            PackageTarget::Requirements(path) => {
                if !path.is_file() {
                    return Err(ResourceError::NotFound(path.display().to_string()).into());
                }
                let path = path.to_string_lossy().into_owned();
                self.installer.install(self.executor, &["-r", path.as_str()])?;
            }
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for PackageResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if let Some(path) = self.requirements_file() {
            if !path.is_file() {
                return Ok(ResourceState::Invalid {
                    reason: format!("requirements file not found: {}", path.display()),
                });
            }
            return Ok(ResourceState::Missing);
        }
        let installed = get_installed_packages(self.ecosystem, self.installer, self.executor)?;
        Ok(self.state_from_installed(&installed))
    }
}
