//! rpmalloc static library builds.
//!
//! On Linux hosts the release `gn` binary is linked against rpmalloc for a
//! small speed boost. One static library is built per distinct target
//! platform appearing across all build configurations.

use crate::runner::{Step, StepRunner};
use crate::target::Target;
use crate::tasks::build::Config;
use crate::tasks::environment::compilation_env;
use crate::util::paths::Workspace;
use anyhow::Result;
use std::path::{Path, PathBuf};

const RPMALLOC_GIT_URL: &str =
    "https://fuchsia.googlesource.com/third_party/github.com/mjansson/rpmalloc";
const RPMALLOC_REVISION: &str = "9c030f7a5efed87e3d036440e753c31342f9f909";

/// rpmalloc's build system spells some os/arch names differently.
fn rpmalloc_name(s: &str) -> &str {
    match s {
        "amd64" => "x86-64",
        "mac" => "macos",
        other => other,
    }
}

/// Static libraries keyed by target platform, in first-seen order.
pub struct StaticLibs(Vec<(String, PathBuf)>);

impl StaticLibs {
    pub fn get(&self, platform: &str) -> Option<&Path> {
        self.0
            .iter()
            .find(|(p, _)| p == platform)
            .map(|(_, lib)| lib.as_path())
    }
}

/// Every distinct target platform across all configurations, first-seen
/// order. Several config entries may name the same platform; each platform
/// is built once.
fn distinct_platforms(configs: &[Config]) -> Vec<Target> {
    let mut platforms: Vec<Target> = Vec::new();
    for config in configs {
        for &target in &config.targets {
            if !platforms.contains(&target) {
                platforms.push(target);
            }
        }
    }
    platforms
}

pub fn build_static_libs(
    configs: &[Config],
    ws: &Workspace,
    runner: &mut dyn StepRunner,
) -> Result<StaticLibs> {
    let src = ws.rpmalloc_src_dir();

    runner.run(Step::command(
        "rpmalloc.init",
        "git",
        vec!["init".to_string(), src.display().to_string()],
    ))?;
    runner.run(
        Step::command(
            "rpmalloc.fetch",
            "git",
            ["fetch", "--tags", RPMALLOC_GIT_URL, RPMALLOC_REVISION],
        )
        .cwd(&src),
    )?;
    runner.run(Step::command("rpmalloc.checkout", "git", ["checkout", "FETCH_HEAD"]).cwd(&src))?;

    let mut libs = Vec::new();
    for target in distinct_platforms(configs) {
        let platform = target.platform();
        let os = rpmalloc_name(target.os.name());
        let arch = rpmalloc_name(target.arch.name());

        // rpmalloc only builds in-tree, so each platform gets its own copy
        // of the sources.
        let build_dir = ws.rpmalloc_build_dir(&platform);
        runner.run(Step::remove_tree(
            format!("rpmalloc.remove sources {platform}"),
            &build_dir,
        ))?;
        runner.run(Step::copy_tree(
            format!("rpmalloc.copy sources {platform}"),
            &src,
            &build_dir,
        ))?;

        let env = compilation_env(target, &ws.cipd_dir(), runner)?;
        let prefix = format!("rpmalloc.build rpmalloc-{platform}");

        runner.run(
            Step::command(
                format!("{prefix}.configure"),
                "python3",
                ["configure.py", "-c", "release", "-a", arch, "--lto"],
            )
            .cwd(&build_dir)
            .env(&env),
        )?;

        // Only the static library target, not the whole tree.
        let lib = PathBuf::from("lib")
            .join(os)
            .join("release")
            .join(arch)
            .join("librpmallocwrap.a");
        runner.run(
            Step::command(
                format!("{prefix}.ninja"),
                ws.ninja(),
                vec![lib.display().to_string()],
            )
            .cwd(&build_dir)
            .env(&env),
        )?;

        libs.push((platform, build_dir.join(lib)));
    }

    Ok(StaticLibs(libs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ReplayRunner;
    use crate::tasks::build::configs;

    #[test]
    fn maps_names_to_rpmalloc_spelling() {
        assert_eq!(rpmalloc_name("amd64"), "x86-64");
        assert_eq!(rpmalloc_name("mac"), "macos");
        assert_eq!(rpmalloc_name("linux"), "linux");
        assert_eq!(rpmalloc_name("arm64"), "arm64");
    }

    #[test]
    fn builds_each_platform_once_across_configs() {
        // On a linux-amd64 host the debug config targets the host and the
        // release config targets linux-amd64 + linux-arm64; linux-amd64
        // appears twice but must only be built once.
        let host = Target::parse("linux-amd64").unwrap();
        let cfgs = configs(host);
        let ws = Workspace::new("/work");
        let mut runner = ReplayRunner::new();
        let libs = build_static_libs(&cfgs, &ws, &mut runner).unwrap();

        let configures: Vec<&str> = runner
            .names()
            .into_iter()
            .filter(|n| n.ends_with(".configure"))
            .collect();
        assert_eq!(
            configures,
            vec![
                "rpmalloc.build rpmalloc-linux-amd64.configure",
                "rpmalloc.build rpmalloc-linux-arm64.configure",
            ]
        );

        assert_eq!(
            libs.get("linux-arm64").unwrap(),
            Path::new("/work/.cleanup/rpmalloc-linux-arm64/lib/linux/release/arm64/librpmallocwrap.a")
        );
        assert!(libs.get("mac-amd64").is_none());
    }
}
