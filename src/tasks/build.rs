//! Build configurations and the generate/build/test steps for one target.

use crate::runner::{Step, StepRunner};
use crate::target::{Arch, Os, Target};
use crate::tasks::environment::compilation_env;
use crate::util::paths::Workspace;
use anyhow::Result;
use std::path::Path;

pub struct Config {
    pub name: &'static str,
    pub gen_args: &'static [&'static str],
    pub targets: Vec<Target>,
}

/// Debug before release: the release build is the one that gets uploaded,
/// and its artifacts must be the last thing left in the out directory.
pub fn configs(host: Target) -> Vec<Config> {
    let release_targets = if host.is_linux() {
        vec![
            Target::new(Os::Linux, Arch::Amd64),
            Target::new(Os::Linux, Arch::Arm64),
        ]
    } else {
        vec![host]
    };
    vec![
        Config {
            name: "debug",
            gen_args: &["-d"],
            targets: vec![host],
        },
        Config {
            name: "release",
            gen_args: &["--use-lto", "--use-icf"],
            targets: release_targets,
        },
    ]
}

pub fn build_and_test(
    config: &Config,
    target: Target,
    host: Target,
    ws: &Workspace,
    rpmalloc_lib: Option<&Path>,
    runner: &mut dyn StepRunner,
) -> Result<()> {
    let src = ws.src_dir();
    let prefix = format!("{}.{}", config.name, target.platform());
    let env = compilation_env(target, &ws.cipd_dir(), runner)?;

    let mut gen_args: Vec<String> = vec![src.join("build/gen.py").display().to_string()];
    gen_args.extend(config.gen_args.iter().map(|a| a.to_string()));
    if let Some(lib) = rpmalloc_lib {
        gen_args.push(format!("--link-lib={}", lib.display()));
    }
    runner.run(
        Step::command(format!("{prefix}.generate"), "python3", gen_args)
            .cwd(&src)
            .env(&env),
    )?;

    // Windows needs the environment when building too, so it stays applied.
    runner.run(
        Step::command(
            format!("{prefix}.build"),
            ws.ninja(),
            vec!["-C".to_string(), ws.out_dir().display().to_string()],
        )
        .cwd(&src)
        .env(&env),
    )?;

    if target == host {
        runner.run(Step::command(
            format!("{prefix}.test"),
            ws.out_dir().join("gn_unittests"),
            Vec::<String>::new(),
        ))?;
    }

    Ok(())
}
