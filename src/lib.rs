//! Layered provisioning for development workspaces.
//!
//! Links dotfiles into `$HOME`, installs a base set of packages and a plugin
//! repository, then layers user extensions from environment variables, an
//! override directory and command-line flags on top.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: assemble the layered configuration once at entry
//! - **[`plan`]**: resolve the configuration into ordered phases of directives
//! - **[`phases`]**: execute a plan sequentially with recoverable/fatal outcomes
//! - **[`resources`]**: idempotent `check + apply` primitives (symlinks, packages, …)
//! - **[`commands`]**: end-to-end orchestration used by the binary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod phases;
pub mod plan;
pub mod resources;
