//! Resolution of the layered configuration into an ordered plan.
//!
//! A [`Plan`] groups [`Directive`]s into [`Phase`]s. Phase membership depends
//! only on which extension source produced a directive, and phases always run
//! in [`Phase::ALL`] order.
mod directive;

pub use directive::{Directive, Ecosystem, EnvSetting, PackageTarget, ScriptSource};

use std::fmt;

use crate::config::{Config, OverrideFile, OverrideFiles, defaults};

/// Fixed-order group of directives sharing one source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Dotfile symlinks from the source tree.
    Symlink,
    /// Built-in packages, repository clone and PATH export.
    Defaults,
    /// `DOTFILES_*` environment variables.
    EnvExtensions,
    /// Files in the override directory.
    OverrideFileExtensions,
    /// Command-line extension flags.
    CliExtensions,
}

impl Phase {
    /// Every phase in execution order.
    pub const ALL: [Self; 5] = [
        Self::Symlink,
        Self::Defaults,
        Self::EnvExtensions,
        Self::OverrideFileExtensions,
        Self::CliExtensions,
    ];

    /// Stable identifier used in logs and the summary.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Symlink => "symlink",
            Self::Defaults => "defaults",
            Self::EnvExtensions => "env-extensions",
            Self::OverrideFileExtensions => "override-file-extensions",
            Self::CliExtensions => "cli-extensions",
        }
    }

    /// Stage header printed when the phase starts.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Symlink => "Link dotfiles",
            Self::Defaults => "Install defaults",
            Self::EnvExtensions => "Apply environment extensions",
            Self::OverrideFileExtensions => "Apply override files",
            Self::CliExtensions => "Apply command-line extensions",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A phase scheduled to run with its directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPhase {
    /// Which phase this is.
    pub phase: Phase,
    /// Directives in execution order; may be empty.
    pub directives: Vec<Directive>,
}

/// Ordered set of phases for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    phases: Vec<PlannedPhase>,
    omitted: Vec<(Phase, String)>,
}

impl Plan {
    /// Resolve `config` into a plan.
    #[must_use]
    pub fn resolve(config: &Config) -> Self {
        let mut plan = Self::default();

        plan.push(Phase::Symlink, symlink_directives(config));

        if config.skip_defaults {
            plan.omit(Phase::Defaults, "skip-defaults requested");
        } else {
            plan.push(Phase::Defaults, defaults::directives(&config.home));
        }

        plan.push(Phase::EnvExtensions, env_directives(config));

        match &config.overrides {
            Some(files) => plan.push(Phase::OverrideFileExtensions, override_directives(files)),
            None => plan.omit(
                Phase::OverrideFileExtensions,
                &format!("{} not found", config.override_dir.display()),
            ),
        }

        plan.push(Phase::CliExtensions, cli_directives(config));
        plan
    }

    fn push(&mut self, phase: Phase, directives: Vec<Directive>) {
        self.phases.push(PlannedPhase { phase, directives });
    }

    fn omit(&mut self, phase: Phase, reason: &str) {
        self.omitted.push((phase, reason.to_string()));
    }

    /// Phases that will run, in execution order.
    #[must_use]
    pub fn phases(&self) -> &[PlannedPhase] {
        &self.phases
    }

    /// Phases that will not run, with the reason.
    #[must_use]
    pub fn omitted(&self) -> &[(Phase, String)] {
        &self.omitted
    }

    /// Directives of `phase`, or `None` when the phase does not run.
    #[must_use]
    pub fn directives_of(&self, phase: Phase) -> Option<&[Directive]> {
        self.phases
            .iter()
            .find(|p| p.phase == phase)
            .map(|p| p.directives.as_slice())
    }

    /// Total number of directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.iter().map(|p| p.directives.len()).sum()
    }

    /// Whether the plan has no directives at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable listing, one line per directive, used for dry runs.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for phase in Phase::ALL {
            if let Some(directives) = self.directives_of(phase) {
                out.push_str(&format!("[{phase}]\n"));
                for d in directives {
                    out.push_str(&format!("  {:<15} {d}\n", d.kind()));
                }
            } else if let Some((_, reason)) = self.omitted.iter().find(|(p, _)| *p == phase) {
                out.push_str(&format!("[{phase}] skipped: {reason}\n"));
            }
        }
        out
    }
}

fn symlink_directives(config: &Config) -> Vec<Directive> {
    defaults::KNOWN_DOTFILES
        .iter()
        .map(|name| (config.root.join(name), config.home.join(name)))
        .filter(|(source, _)| source.exists())
        .map(|(source, target)| Directive::Symlink { source, target })
        .collect()
}

fn env_directives(config: &Config) -> Vec<Directive> {
    let env = &config.env;
    let mut out: Vec<Directive> = Directive::packages(Ecosystem::Pip, &env.extra_pip)
        .chain(Directive::packages(Ecosystem::Apt, &env.extra_apt))
        .chain(Directive::packages(Ecosystem::Npm, &env.extra_npm))
        .collect();
    out.extend(Directive::clone_repo(
        &env.custom_repo,
        &config.home.join(defaults::CUSTOM_REPO_DEST),
    ));
    out.extend(
        ScriptSource::parse(&env.custom_script).map(|source| match source {
            ScriptSource::Path(p) => Directive::RunScript(ScriptSource::Path(config.absolute(&p))),
            url @ ScriptSource::Url(_) => Directive::RunScript(url),
        }),
    );
    out
}

fn override_directives(files: &OverrideFiles) -> Vec<Directive> {
    let mut out = Vec::new();
    let mut custom = Vec::new();
    for entry in &files.entries {
        match entry {
            OverrideFile::Packages { ecosystem, names } => {
                out.extend(names.iter().filter_map(|n| Directive::package(*ecosystem, n)));
            }
            OverrideFile::Env(path) => {
                out.push(Directive::SetEnv(EnvSetting::Source(path.clone())));
            }
            OverrideFile::Custom(path) => {
                custom.push(Directive::RunScript(ScriptSource::Path(path.clone())));
            }
        }
    }
    // custom.sh runs after everything else from the directory.
    out.extend(custom);
    out
}

fn cli_directives(config: &Config) -> Vec<Directive> {
    let cli = &config.cli;
    let mut out = Vec::new();
    if let Some(path) = &cli.pip_requirements {
        out.push(Directive::InstallPackage {
            ecosystem: Ecosystem::Pip,
            target: PackageTarget::Requirements(path.clone()),
        });
    }
    out.extend(Directive::packages(Ecosystem::Apt, &cli.apt_packages));
    out.extend(Directive::packages(Ecosystem::Npm, &cli.npm_packages));
    if let Some(path) = &cli.post_script {
        out.push(Directive::RunScript(ScriptSource::Path(path.clone())));
    }
    out
}
