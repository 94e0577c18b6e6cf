//! Sequential execution of a resolved [`Plan`].
//!
//! Phases run strictly in order, one directive at a time. Before a phase
//! starts every tool it needs is resolved; a missing tool aborts the rest of
//! the run. Everything else that goes wrong is recorded against the directive
//! and execution continues.
mod apply;
mod context;
mod tools;

pub use context::Context;

use crate::error::FatalError;
use crate::logging::{DirectiveStatus, ExecutionResult};
use crate::plan::{Phase, Plan};

/// What happened to a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Every directive was attempted.
    Ran,
    /// The phase was left out of the plan.
    Skipped(String),
    /// A required tool was missing; nothing in the phase ran.
    Fatal,
    /// An earlier phase failed fatally.
    NotRun,
}

/// Outcome of one phase, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRecord {
    /// Which phase.
    pub phase: Phase,
    /// What happened to it.
    pub outcome: PhaseOutcome,
}

/// Directive counts for one phase or the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Directives that changed the system.
    pub applied: usize,
    /// Directives that were already satisfied.
    pub already_ok: usize,
    /// Directives previewed in dry-run mode.
    pub dry_run: usize,
    /// Recoverable and fatal failures.
    pub failed: usize,
}

impl Counts {
    fn add(&mut self, status: DirectiveStatus) {
        match status {
            DirectiveStatus::Applied => self.applied += 1,
            DirectiveStatus::AlreadyCorrect => self.already_ok += 1,
            DirectiveStatus::DryRun => self.dry_run += 1,
            DirectiveStatus::FailedRecoverable | DirectiveStatus::FailedFatal => {
                self.failed += 1;
            }
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Per-directive results in execution order.
    pub results: Vec<ExecutionResult>,
    /// Per-phase outcomes in [`Phase::ALL`] order.
    pub phases: Vec<PhaseRecord>,
    /// The error that aborted the run, if any.
    pub fatal: Option<FatalError>,
}

impl Report {
    /// Counts for `phase`.
    #[must_use]
    pub fn counts(&self, phase: Phase) -> Counts {
        let mut counts = Counts::default();
        for r in self.results.iter().filter(|r| r.phase == phase) {
            counts.add(r.status);
        }
        counts
    }

    /// Counts across every phase.
    #[must_use]
    pub fn total(&self) -> Counts {
        let mut counts = Counts::default();
        for r in &self.results {
            counts.add(r.status);
        }
        counts
    }

    /// Recoverable failures, in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results
            .iter()
            .filter(|r| r.status == DirectiveStatus::FailedRecoverable)
    }

    /// Results of `phase`, in execution order.
    pub fn results_of(&self, phase: Phase) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(move |r| r.phase == phase)
    }

    /// Outcome recorded for `phase`.
    #[must_use]
    pub fn outcome(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases
            .iter()
            .find(|p| p.phase == phase)
            .map(|p| &p.outcome)
    }
}

/// Execute `plan` and collect the results.
#[must_use]
pub fn execute(plan: &Plan, ctx: &Context) -> Report {
    let mut report = Report::default();
    let mut state = apply::RunState::default();

    for phase in Phase::ALL {
        if let Some((_, reason)) = plan.omitted().iter().find(|(p, _)| *p == phase) {
            ctx.log.debug(&format!("{phase}: skipped ({reason})"));
            report.phases.push(PhaseRecord {
                phase,
                outcome: PhaseOutcome::Skipped(reason.clone()),
            });
            continue;
        }
        let Some(directives) = plan.directives_of(phase) else {
            continue;
        };
        if report.fatal.is_some() {
            report.phases.push(PhaseRecord {
                phase,
                outcome: PhaseOutcome::NotRun,
            });
            continue;
        }

        ctx.log.stage(phase.title());
        if let Err(fatal) = tools::check(ctx, &mut state, phase, directives) {
            ctx.log.error(&fatal.to_string());
            report
                .results
                .extend(directives.iter().map(|d| ExecutionResult {
                    phase,
                    directive: d.clone(),
                    status: DirectiveStatus::FailedFatal,
                    message: Some(fatal.to_string()),
                }));
            report.phases.push(PhaseRecord {
                phase,
                outcome: PhaseOutcome::Fatal,
            });
            report.fatal = Some(fatal);
            continue;
        }

        if directives.is_empty() {
            ctx.log.debug(&format!("{phase}: nothing to do"));
        }
        for directive in directives {
            let result = apply::run_directive(ctx, &mut state, phase, directive);
            report.results.push(result);
        }
        report.phases.push(PhaseRecord {
            phase,
            outcome: PhaseOutcome::Ran,
        });
    }
    report
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::{CliExtensions, Config, EnvExtensions};
    use crate::logging::test_helpers::CapturingLog;
    use crate::resources::test_helpers::MockExecutor;
    use std::path::Path;
    use std::sync::Arc;

    struct Fixture {
        _tmp: tempfile::TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path().join("dotfiles");
            let home = tmp.path().join("home");
            std::fs::create_dir_all(&root).unwrap();
            std::fs::create_dir_all(&home).unwrap();
            std::fs::write(root.join(".vimrc"), "set number\n").unwrap();
            std::fs::write(root.join(".gitconfig"), "[user]\n").unwrap();
            let config = Config {
                cwd: root.clone(),
                override_dir: home.join(".dotfiles-extra"),
                shell_rc: home.join(".bashrc"),
                cache_dir: tmp.path().join("cache/dotfiles"),
                skip_defaults: true,
                verbose: false,
                dry_run: false,
                env: EnvExtensions::default(),
                overrides: None,
                cli: CliExtensions::default(),
                root,
                home,
            };
            Self { _tmp: tmp, config }
        }

        fn home(&self) -> &Path {
            &self.config.home
        }

        fn run(&self, executor: &Arc<MockExecutor>) -> (Report, Arc<CapturingLog>) {
            let log = Arc::new(CapturingLog::default());
            let ctx = Context::new(
                Arc::new(self.config.clone()),
                log.clone(),
                executor.clone(),
            );
            let plan = Plan::resolve(&self.config);
            (execute(&plan, &ctx), log)
        }
    }

    fn statuses(report: &Report, phase: Phase) -> Vec<DirectiveStatus> {
        report.results_of(phase).map(|r| r.status).collect()
    }

    #[test]
    fn symlinks_are_applied_then_idempotent() {
        let fx = Fixture::new();
        let executor = Arc::new(MockExecutor::ok());

        let (first, _) = fx.run(&executor);
        assert_eq!(
            statuses(&first, Phase::Symlink),
            vec![DirectiveStatus::Applied, DirectiveStatus::Applied]
        );
        assert!(fx.home().join(".vimrc").is_symlink());

        let (second, _) = fx.run(&executor);
        assert_eq!(
            statuses(&second, Phase::Symlink),
            vec![DirectiveStatus::AlreadyCorrect, DirectiveStatus::AlreadyCorrect]
        );
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn skipped_phases_are_recorded_with_reasons() {
        let fx = Fixture::new();
        let (report, _) = fx.run(&Arc::new(MockExecutor::ok()));
        assert_eq!(
            report.outcome(Phase::Defaults),
            Some(&PhaseOutcome::Skipped("skip-defaults requested".to_string()))
        );
        assert!(matches!(
            report.outcome(Phase::OverrideFileExtensions),
            Some(PhaseOutcome::Skipped(reason)) if reason.ends_with("not found")
        ));
        assert_eq!(report.outcome(Phase::CliExtensions), Some(&PhaseOutcome::Ran));
        let order: Vec<Phase> = report.phases.iter().map(|p| p.phase).collect();
        assert_eq!(order, Phase::ALL.to_vec());
    }

    #[test]
    fn installed_packages_are_queried_once_and_skipped() {
        let mut fx = Fixture::new();
        fx.config.env.extra_pip = "alpha beta alpha".to_string();
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "alpha==1.0\n".to_string()),
            (true, String::new()),
        ]));

        let (report, _) = fx.run(&executor);
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![
                DirectiveStatus::AlreadyCorrect,
                DirectiveStatus::Applied,
                DirectiveStatus::AlreadyCorrect,
            ]
        );
        assert_eq!(
            executor.calls(),
            vec!["pip3 list --format=freeze", "pip3 install beta"]
        );
    }

    #[test]
    fn duplicates_across_phases_install_once() {
        let mut fx = Fixture::new();
        fx.config.env.extra_npm = "typescript".to_string();
        fx.config.cli.npm_packages = "typescript".to_string();
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "/usr/lib\n".to_string()),
            (true, String::new()),
        ]));

        let (report, _) = fx.run(&executor);
        assert_eq!(statuses(&report, Phase::EnvExtensions), vec![DirectiveStatus::Applied]);
        assert_eq!(
            statuses(&report, Phase::CliExtensions),
            vec![DirectiveStatus::AlreadyCorrect]
        );
        assert_eq!(executor.calls().len(), 2);
    }

    #[test]
    fn package_failure_is_recoverable() {
        let mut fx = Fixture::new();
        fx.config.env.extra_pip = "nonexistent-pkg beta".to_string();
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, String::new()),
            (false, String::new()),
            (true, String::new()),
        ]));

        let (report, log) = fx.run(&executor);
        assert!(report.fatal.is_none());
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::FailedRecoverable, DirectiveStatus::Applied]
        );
        assert_eq!(report.failures().count(), 1);
        assert!(log.at("warn").iter().any(|l| l.contains("nonexistent-pkg")));
    }

    #[test]
    fn missing_tool_aborts_remaining_phases() {
        let mut fx = Fixture::new();
        fx.config.env.extra_apt = "htop".to_string();
        fx.config.cli.npm_packages = "typescript".to_string();
        let executor = Arc::new(MockExecutor::ok().with_tools(&["npm"]));

        let (report, log) = fx.run(&executor);
        assert_eq!(
            report.fatal,
            Some(FatalError::MissingTool {
                phase: Phase::EnvExtensions,
                tool: "apt-get".to_string(),
            })
        );
        assert_eq!(report.outcome(Phase::Symlink), Some(&PhaseOutcome::Ran));
        assert_eq!(report.outcome(Phase::EnvExtensions), Some(&PhaseOutcome::Fatal));
        assert_eq!(report.outcome(Phase::CliExtensions), Some(&PhaseOutcome::NotRun));
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::FailedFatal]
        );
        assert!(executor.calls().is_empty());
        assert_eq!(log.at("error").len(), 1);
    }

    #[test]
    fn missing_tool_in_dry_run_is_a_warning() {
        let mut fx = Fixture::new();
        fx.config.dry_run = true;
        fx.config.env.extra_apt = "htop".to_string();
        let executor = Arc::new(MockExecutor::ok().with_tools(&[]));

        let (report, log) = fx.run(&executor);
        assert!(report.fatal.is_none());
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::DryRun]
        );
        assert!(log.at("warn").iter().any(|l| l.contains("apt-get")));
        assert!(!fx.home().join(".vimrc").exists());
    }

    #[test]
    fn apt_update_runs_once_and_failure_is_a_warning() {
        let mut fx = Fixture::new();
        fx.config.env.extra_apt = "htop tree".to_string();
        let executor = Arc::new(
            MockExecutor::with_responses(vec![
                (true, "ii  git\n".to_string()),
                (false, String::new()),
                (true, String::new()),
                (true, String::new()),
            ])
            .with_tools(&["apt-get", "sudo"]),
        );

        let (report, log) = fx.run(&executor);
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::Applied, DirectiveStatus::Applied]
        );
        let calls = executor.calls();
        assert_eq!(calls.iter().filter(|c| c.contains("update")).count(), 1);
        assert_eq!(calls[1], "sudo apt-get update");
        assert!(log.at("warn").iter().any(|l| l.contains("apt-get update")));
    }

    #[test]
    fn removed_but_not_purged_apt_package_is_reinstalled() {
        let mut fx = Fixture::new();
        fx.config.env.extra_apt = "htop".to_string();
        let executor = Arc::new(
            MockExecutor::with_responses(vec![
                (true, "rc  htop\nii  git\n".to_string()),
                (true, String::new()),
                (true, String::new()),
            ])
            .with_tools(&["apt-get", "sudo"]),
        );

        let (report, _) = fx.run(&executor);
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::Applied]
        );
        assert_eq!(
            executor.calls().last().unwrap(),
            "sudo env DEBIAN_FRONTEND=noninteractive apt-get install -y htop"
        );
    }

    #[test]
    fn pinned_pip_package_is_handed_to_the_installer() {
        let mut fx = Fixture::new();
        fx.config.env.extra_pip = "black==24.1.0".to_string();
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "black==23.1.0\n".to_string()),
            (true, String::new()),
        ]));

        let (report, _) = fx.run(&executor);
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::Applied]
        );
        assert_eq!(executor.calls()[1], "pip3 install black==24.1.0");
    }

    #[test]
    fn missing_post_script_is_recoverable() {
        let mut fx = Fixture::new();
        fx.config.cli.npm_packages = "tldr".to_string();
        fx.config.cli.post_script = Some(fx.config.cwd.join("missing-post.sh"));
        let executor = Arc::new(MockExecutor::ok());

        let (report, log) = fx.run(&executor);
        assert!(report.fatal.is_none());
        assert_eq!(
            statuses(&report, Phase::CliExtensions),
            vec![DirectiveStatus::Applied, DirectiveStatus::FailedRecoverable]
        );
        assert!(executor.calls().iter().all(|c| !c.starts_with("bash")));
        assert!(log.at("warn").iter().any(|l| l.contains("missing-post.sh")));
    }

    #[test]
    fn missing_custom_script_does_not_stop_later_phases() {
        let mut fx = Fixture::new();
        fx.config.env.custom_script = fx.config.cwd.join("nope.sh").display().to_string();
        fx.config.cli.npm_packages = "tldr".to_string();
        let executor = Arc::new(MockExecutor::ok());

        let (report, _) = fx.run(&executor);
        assert_eq!(
            statuses(&report, Phase::EnvExtensions),
            vec![DirectiveStatus::FailedRecoverable]
        );
        assert_eq!(report.outcome(Phase::CliExtensions), Some(&PhaseOutcome::Ran));
        assert_eq!(
            statuses(&report, Phase::CliExtensions),
            vec![DirectiveStatus::Applied]
        );
    }

    #[test]
    fn missing_requirements_file_is_recoverable() {
        let mut fx = Fixture::new();
        fx.config.cli.pip_requirements = Some(fx.config.cwd.join("missing.txt"));
        let executor = Arc::new(MockExecutor::ok());

        let (report, _) = fx.run(&executor);
        assert!(report.fatal.is_none());
        let cli: Vec<_> = report.results_of(Phase::CliExtensions).collect();
        assert_eq!(cli.len(), 1);
        assert_eq!(cli[0].status, DirectiveStatus::FailedRecoverable);
        assert!(cli[0].message.as_deref().unwrap().contains("missing.txt"));
    }

    #[test]
    fn post_script_runs_last_with_bash() {
        let mut fx = Fixture::new();
        let script = fx.config.cwd.join("post.sh");
        std::fs::write(&script, "true\n").unwrap();
        fx.config.cli.apt_packages = String::new();
        fx.config.cli.npm_packages = "tldr".to_string();
        fx.config.cli.post_script = Some(script.clone());
        let executor = Arc::new(MockExecutor::ok());

        let (report, _) = fx.run(&executor);
        let calls = executor.calls();
        assert_eq!(calls.last().unwrap(), &format!("bash {}", script.display()));
        assert_eq!(report.counts(Phase::CliExtensions).applied, 2);
    }

    #[test]
    fn dry_run_changes_nothing() {
        let mut fx = Fixture::new();
        fx.config.dry_run = true;
        fx.config.skip_defaults = false;
        let executor = Arc::new(MockExecutor::ok());

        let (report, log) = fx.run(&executor);
        assert!(!fx.home().join(".vimrc").exists());
        assert!(!fx.home().join(".bashrc").exists());
        assert_eq!(report.total().applied, 0);
        assert!(report.total().dry_run > 0);
        assert!(!log.at("dry_run").is_empty());
        assert!(executor.calls().iter().all(|c| !c.contains("install")));
    }

    #[test]
    fn counts_split_by_status() {
        let mut fx = Fixture::new();
        fx.config.env.extra_pip = "a b".to_string();
        let executor = Arc::new(MockExecutor::with_responses(vec![
            (true, "a==1\n".to_string()),
            (false, String::new()),
        ]));
        let (report, _) = fx.run(&executor);
        assert_eq!(
            report.counts(Phase::EnvExtensions),
            Counts {
                applied: 0,
                already_ok: 1,
                dry_run: 0,
                failed: 1,
            }
        );
        assert_eq!(report.total().applied, 2);
    }
}
