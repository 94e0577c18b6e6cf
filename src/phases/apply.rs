//! Single-directive processing: check state, then apply or preview.
use std::collections::{HashMap, HashSet};

use super::context::Context;
use crate::exec::Executor;
use crate::logging::{DirectiveStatus, ExecutionResult};
use crate::plan::{Directive, Ecosystem, PackageTarget, Phase, ScriptSource};
use crate::resources::package::{self, Installer, PackageResource};
use crate::resources::repo::RepoResource;
use crate::resources::script::ScriptResource;
use crate::resources::shell::ShellLineResource;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable, Resource, ResourceChange, ResourceState};

/// State carried across every phase of one run.
#[derive(Debug, Default)]
pub(super) struct RunState {
    installers: HashMap<Ecosystem, Option<Installer>>,
    installed: HashMap<Ecosystem, HashSet<String>>,
    apt_updated: bool,
}

impl RunState {
    /// Installer for `ecosystem`, resolved on first use.
    pub(super) fn installer(
        &mut self,
        ecosystem: Ecosystem,
        executor: &dyn Executor,
    ) -> Option<&Installer> {
        self.installers
            .entry(ecosystem)
            .or_insert_with(|| Installer::resolve(ecosystem, executor))
            .as_ref()
    }

    /// Installed set for `ecosystem`, queried once per run.
    fn installed(
        &mut self,
        ctx: &Context,
        ecosystem: Ecosystem,
        installer: &Installer,
    ) -> &mut HashSet<String> {
        self.installed.entry(ecosystem).or_insert_with(|| {
            package::get_installed_packages(ecosystem, installer, &*ctx.executor)
                .unwrap_or_else(|e| {
                    ctx.log
                        .warn(&format!("could not list installed {ecosystem} packages: {e:#}"));
                    HashSet::new()
                })
        })
    }
}

type Outcome = (DirectiveStatus, Option<String>);

/// Run one directive and record its result.
pub(super) fn run_directive(
    ctx: &Context,
    state: &mut RunState,
    phase: Phase,
    directive: &Directive,
) -> ExecutionResult {
    let executor = &*ctx.executor;
    let (status, message) = match directive {
        Directive::Symlink { source, target } => {
            let resource = SymlinkResource::new(source.clone(), target.clone());
            process(ctx, &resource, "link")
        }
        Directive::SetEnv(setting) => {
            let resource =
                ShellLineResource::new(ctx.config.shell_rc.clone(), setting.shell_line());
            process(ctx, &resource, "add")
        }
        Directive::CloneRepo { url, dest } => {
            let resource = RepoResource::new(url.clone(), dest.clone(), executor);
            process(ctx, &resource, "clone")
        }
        Directive::RunScript(source) => run_script(ctx, source),
        Directive::InstallPackage { ecosystem, target } => {
            run_package(ctx, state, *ecosystem, target)
        }
    };
    ExecutionResult {
        phase,
        directive: directive.clone(),
        status,
        message,
    }
}

/// Check a resource's state and apply it when it needs changing.
fn process<R: Resource>(ctx: &Context, resource: &R, verb: &str) -> Outcome {
    match resource.current_state() {
        Ok(state) => settle(ctx, resource, state, verb),
        Err(e) => fail(ctx, &resource.description(), verb, &format!("{e:#}")),
    }
}

/// Turn a known state into an outcome, applying in non-dry-run mode.
fn settle<R: Applicable>(ctx: &Context, resource: &R, state: ResourceState, verb: &str) -> Outcome {
    let desc = resource.description();
    match state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            (DirectiveStatus::AlreadyCorrect, None)
        }
        ResourceState::Invalid { reason } => fail(ctx, &desc, verb, &reason),
        ResourceState::Incorrect { current } if ctx.dry_run => {
            ctx.log
                .dry_run(&format!("would {verb} {desc} (currently {current})"));
            (DirectiveStatus::DryRun, None)
        }
        ResourceState::Missing if ctx.dry_run => {
            ctx.log.dry_run(&format!("would {verb}: {desc}"));
            (DirectiveStatus::DryRun, None)
        }
        ResourceState::Missing | ResourceState::Incorrect { .. } => apply(ctx, resource, verb),
    }
}

/// Apply a resource change.
fn apply<R: Applicable>(ctx: &Context, resource: &R, verb: &str) -> Outcome {
    let desc = resource.description();
    match resource.apply() {
        Ok(ResourceChange::Applied) => {
            ctx.log.info(&format!("{verb}: {desc}"));
            (DirectiveStatus::Applied, None)
        }
        Ok(ResourceChange::AlreadyCorrect) => {
            ctx.log.debug(&format!("ok: {desc}"));
            (DirectiveStatus::AlreadyCorrect, None)
        }
        Err(e) => fail(ctx, &desc, verb, &format!("{e:#}")),
    }
}

fn fail(ctx: &Context, desc: &str, verb: &str, reason: &str) -> Outcome {
    ctx.log.warn(&format!("failed to {verb} {desc}: {reason}"));
    (DirectiveStatus::FailedRecoverable, Some(reason.to_string()))
}

fn run_script(ctx: &Context, source: &ScriptSource) -> Outcome {
    let resource = ScriptResource::new(
        source.clone(),
        ctx.config.root.clone(),
        ctx.config.cache_dir.clone(),
        &*ctx.executor,
    );
    if let ScriptSource::Path(path) = source
        && !path.is_file()
    {
        return fail(
            ctx,
            &resource.description(),
            "run",
            &format!("file not found: {}", path.display()),
        );
    }
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would run: {}", resource.description()));
        return (DirectiveStatus::DryRun, None);
    }
    apply(ctx, &resource, "run")
}

fn run_package(
    ctx: &Context,
    state: &mut RunState,
    ecosystem: Ecosystem,
    target: &PackageTarget,
) -> Outcome {
    let Some(installer) = state.installer(ecosystem, &*ctx.executor).cloned() else {
        // Only reachable in dry-run: a missing installer is fatal otherwise.
        let what = match target {
            PackageTarget::Name(name) => name.clone(),
            PackageTarget::Requirements(path) => format!("-r {}", path.display()),
        };
        ctx.log
            .dry_run(&format!("would install: {what} ({ecosystem}); installer not found"));
        return (DirectiveStatus::DryRun, None);
    };
    let resource = PackageResource::new(ecosystem, target.clone(), &installer, &*ctx.executor);

    let current = match resource.key() {
        Some(_) => resource.state_from_installed(state.installed(ctx, ecosystem, &installer)),
        None => match resource.current_state() {
            Ok(s) => s,
            Err(e) => return fail(ctx, &resource.description(), "install", &format!("{e:#}")),
        },
    };

    if ecosystem == Ecosystem::Apt
        && !ctx.dry_run
        && !state.apt_updated
        && matches!(current, ResourceState::Missing)
    {
        state.apt_updated = true;
        if let Err(e) = package::apt_update(&*ctx.executor) {
            ctx.log.warn(&format!("apt-get update failed: {e:#}"));
        }
    }

    let outcome = settle(ctx, &resource, current, "install");
    if outcome.0 == DirectiveStatus::Applied
        && let Some(key) = resource.key()
    {
        state.installed(ctx, ecosystem, &installer).insert(key);
    }
    outcome
}
