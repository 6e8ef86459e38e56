//! The full pipeline: checkout, toolchain, allocator, build/test loop,
//! packaging and publishing.

use crate::context::BuildContext;
use crate::runner::{DryRunner, HostRunner, StepRunner};
use crate::target::Target;
use crate::tasks::{build, checkout, rpmalloc, toolchain, upload};
use crate::util::paths::Workspace;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run(
    repository: &str,
    build_input: Option<&Path>,
    work_dir: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let ctx = BuildContext::load(build_input)?;
    let host = Target::host()?;
    let start_dir = match work_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let ws = Workspace::new(start_dir);
    if dry_run {
        run_recipe(host, repository, &ctx, &ws, &mut DryRunner)
    } else {
        run_recipe(host, repository, &ctx, &ws, &mut HostRunner)
    }
}

/// Emits the whole step sequence for one invocation. All branching is on the
/// host platform and the build context, so the trace is deterministic.
pub fn run_recipe(
    host: Target,
    repository: &str,
    ctx: &BuildContext,
    ws: &Workspace,
    runner: &mut dyn StepRunner,
) -> Result<()> {
    let revision = checkout::checkout(repository, ctx, ws, runner)?;
    toolchain::ensure(host, ws, runner)?;

    let configs = build::configs(host);

    // rpmalloc linking is only wired up for Linux so far.
    let rpmalloc_libs = if host.is_linux() {
        Some(rpmalloc::build_static_libs(&configs, ws, runner)?)
    } else {
        None
    };

    for config in &configs {
        for &target in &config.targets {
            let lib = match &rpmalloc_libs {
                Some(libs) if config.name == "release" => libs.get(&target.platform()),
                _ => None,
            };
            build::build_and_test(config, target, host, ws, lib, runner)?;

            if ctx.is_try() {
                continue;
            }
            if config.name != "release" {
                continue;
            }
            upload::upload(target, repository, &revision, ctx, ws, runner)?;
        }
    }

    Ok(())
}
