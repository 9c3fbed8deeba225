//! # Local virt-builder repositories
//!
//! This crate maintains a directory of compressed disk images together with
//! the index file `virt-builder` reads to discover them. Images are either
//! registered as built elsewhere ([`add`]) or built from a base template
//! ([`update`]); both are then published with [`finalize`].

pub mod add;
pub mod checksum;
pub mod cli;
pub mod compress;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod exec;
pub mod finalize;
pub mod index;
pub mod ini;
pub mod list;
pub mod lookup;
pub mod repo;
#[cfg(test)]
mod testutil;
pub mod update;

use anyhow::Result;

use crate::cli::{Cmd, Opt};
use crate::config::ToolConfig;
use crate::context::RepoContext;
use crate::exec::HostRunner;
use crate::repo::Repository;

/// Execute a command against the host.
pub fn run(opt: &Opt) -> Result<()> {
    let config = ToolConfig::load(opt.config.as_deref())?;
    let descriptor = opt
        .repo_config
        .clone()
        .unwrap_or_else(|| config.descriptor_path(&opt.repo));
    let repo = Repository::resolve(&opt.repo, &descriptor)?;
    let runner = HostRunner;
    let ctx = RepoContext::new(&runner, &config, repo);
    run_in(&ctx, &opt.cmd)
}

/// Execute a command with the given context.
pub fn run_in(ctx: &RepoContext<'_>, cmd: &Cmd) -> Result<()> {
    let _span = ctx.span.enter();
    match cmd {
        Cmd::Add(opts) => finalize::finalize(ctx, add::add(ctx, opts)?),
        Cmd::Update(opts) => finalize::finalize(ctx, update::update(ctx, opts)?),
        Cmd::List => list::list(ctx),
    }
}
