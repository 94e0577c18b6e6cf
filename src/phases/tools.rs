//! Up-front resolution of the external tools a phase needs.
use crate::error::FatalError;
use crate::plan::{Directive, Ecosystem, Phase};
use crate::resources::package::Installer;

use super::apply::RunState;
use super::context::Context;

/// An external tool some directive kind depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    /// Package installer, with its fallback chain.
    Installer(Ecosystem),
    /// A plain program looked up on `PATH`.
    Program(&'static str),
}

impl Tool {
    const fn for_directive(directive: &Directive) -> Option<Self> {
        match directive {
            Directive::InstallPackage { ecosystem, .. } => Some(Self::Installer(*ecosystem)),
            Directive::CloneRepo { .. } => Some(Self::Program("git")),
            Directive::RunScript(_) => Some(Self::Program("bash")),
            Directive::Symlink { .. } | Directive::SetEnv(_) => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Installer(ecosystem) => Installer::required_tool(ecosystem),
            Self::Program(program) => program,
        }
    }
}

/// Distinct tools needed by `directives`, in first-use order.
fn needed(directives: &[Directive]) -> Vec<Tool> {
    let mut tools = Vec::new();
    for tool in directives.iter().filter_map(Tool::for_directive) {
        if !tools.contains(&tool) {
            tools.push(tool);
        }
    }
    tools
}

/// Verify every tool `phase` needs is available.
///
/// Installers are resolved into `state` so later directives reuse them. In
/// dry-run mode a missing tool is only a warning.
///
/// # Errors
///
/// Returns [`FatalError::MissingTool`] for the first missing tool.
pub(super) fn check(
    ctx: &Context,
    state: &mut RunState,
    phase: Phase,
    directives: &[Directive],
) -> Result<(), FatalError> {
    for tool in needed(directives) {
        let found = match tool {
            Tool::Installer(ecosystem) => state.installer(ecosystem, &*ctx.executor).is_some(),
            Tool::Program(program) => ctx.executor.which(program),
        };
        if found {
            continue;
        }
        if ctx.dry_run {
            ctx.log.warn(&format!(
                "{phase}: '{}' not found on PATH (would abort outside dry-run)",
                tool.name()
            ));
            continue;
        }
        return Err(FatalError::MissingTool {
            phase,
            tool: tool.name().to_string(),
        });
    }
    Ok(())
}
