//! Packaging and publishing of release binaries.
//!
//! Packaging always runs for release targets of non-patch builds; actual
//! registration is limited to the internal builder project, and is skipped
//! when an instance already exists for the commit so reruns stay safe.

use crate::context::BuildContext;
use crate::runner::{Step, StepRunner};
use crate::target::Target;
use crate::util::paths::Workspace;
use anyhow::Result;

pub fn upload(
    target: Target,
    repository: &str,
    revision: &str,
    ctx: &BuildContext,
    ws: &Workspace,
    runner: &mut dyn StepRunner,
) -> Result<()> {
    let platform = target.platform();
    let prefix = format!("release.{platform}.upload");
    let pkg_name = format!("gn/gn/{platform}");
    let gn = format!("gn{}", target.exe_suffix());

    let pkg_def = serde_json::json!({
        "package": pkg_name,
        "root": ws.out_dir().display().to_string(),
        "install_mode": "copy",
        "data": [
            { "file": gn },
            { "version_file": format!(".versions/{gn}.cipd_version") },
        ],
    });
    runner.run(Step::write_file(
        format!("{prefix}.pkg-def"),
        ws.pkg_def_file(),
        serde_json::to_string_pretty(&pkg_def)?,
    ))?;

    runner.run(Step::command(
        format!("{prefix}.cipd pkg-build"),
        "cipd",
        vec![
            "pkg-build".to_string(),
            "-pkg-def".to_string(),
            ws.pkg_def_file().display().to_string(),
            "-out".to_string(),
            ws.cipd_pkg_file().display().to_string(),
        ],
    ))?;

    if !ctx.is_internal() {
        return Ok(());
    }

    let tag = format!("git_revision:{revision}");
    let search = runner.run(
        Step::command(
            format!("{prefix}.cipd search {pkg_name} {tag}"),
            "cipd",
            vec![
                "search".to_string(),
                pkg_name.clone(),
                "-tag".to_string(),
                tag.clone(),
            ],
        )
        .capture(),
    )?;

    if search_found(&search.stdout, &pkg_name) {
        runner.run(Step::no_op(format!("{prefix}.Package is up-to-date")))?;
        return Ok(());
    }

    runner.run(Step::command(
        format!("{prefix}.cipd register {pkg_name}"),
        "cipd",
        vec![
            "pkg-register".to_string(),
            ws.cipd_pkg_file().display().to_string(),
            "-ref".to_string(),
            "latest".to_string(),
            "-tag".to_string(),
            format!("git_repository:{repository}"),
            "-tag".to_string(),
            tag,
        ],
    ))?;

    Ok(())
}

/// The CIPD client prints `Instances:` followed by `pkg/path:instance-id`
/// lines on a hit, and `No matching instances.` otherwise.
fn search_found(stdout: &str, pkg_name: &str) -> bool {
    stdout.lines().any(|line| line.trim().starts_with(pkg_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ReplayRunner;

    const REVISION: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn internal_ctx() -> BuildContext {
        let mut ctx = BuildContext::default();
        ctx.project = Some("infra-internal".to_string());
        ctx
    }

    #[test]
    fn search_output_parsing() {
        assert!(search_found(
            "Instances:\n  gn/gn/linux-amd64:abcdef0123\n",
            "gn/gn/linux-amd64"
        ));
        assert!(!search_found("No matching instances.\n", "gn/gn/linux-amd64"));
        assert!(!search_found("", "gn/gn/linux-amd64"));
    }

    #[test]
    fn external_project_packages_without_registering() {
        let ws = Workspace::new("/work");
        let mut runner = ReplayRunner::new();
        upload(
            Target::parse("linux-amd64").unwrap(),
            "https://gn.googlesource.com/gn",
            REVISION,
            &BuildContext::default(),
            &ws,
            &mut runner,
        )
        .unwrap();
        assert_eq!(
            runner.names(),
            vec![
                "release.linux-amd64.upload.pkg-def",
                "release.linux-amd64.upload.cipd pkg-build",
            ]
        );
    }

    #[test]
    fn existing_instance_skips_registration() {
        let ws = Workspace::new("/work");
        let search_step = format!(
            "release.linux-amd64.upload.cipd search gn/gn/linux-amd64 git_revision:{REVISION}"
        );
        let mut runner = ReplayRunner::new()
            .with_output(&search_step, "Instances:\n  gn/gn/linux-amd64:abcdef\n");
        upload(
            Target::parse("linux-amd64").unwrap(),
            "https://gn.googlesource.com/gn",
            REVISION,
            &internal_ctx(),
            &ws,
            &mut runner,
        )
        .unwrap();
        let names = runner.names();
        assert!(!names.iter().any(|n| n.contains("cipd register")));
        // The decision still shows up as a step of its own.
        assert_eq!(
            *names.last().unwrap(),
            "release.linux-amd64.upload.Package is up-to-date"
        );
    }

    #[test]
    fn missing_instance_registers_with_tags_and_latest_ref() {
        let ws = Workspace::new("/work");
        let search_step = format!(
            "release.linux-amd64.upload.cipd search gn/gn/linux-amd64 git_revision:{REVISION}"
        );
        let mut runner = ReplayRunner::new().with_output(&search_step, "No matching instances.\n");
        upload(
            Target::parse("linux-amd64").unwrap(),
            "https://gn.googlesource.com/gn",
            REVISION,
            &internal_ctx(),
            &ws,
            &mut runner,
        )
        .unwrap();
        let Step::Command { args, .. } = runner.steps.last().unwrap() else {
            panic!("expected command step");
        };
        assert_eq!(args[0], "pkg-register");
        assert!(args.contains(&"latest".to_string()));
        assert!(args.contains(&"git_repository:https://gn.googlesource.com/gn".to_string()));
        assert!(args.contains(&format!("git_revision:{REVISION}")));
    }

    #[test]
    fn windows_package_carries_the_exe() {
        let ws = Workspace::new("/work");
        let mut runner = ReplayRunner::new();
        upload(
            Target::parse("win-amd64").unwrap(),
            "https://gn.googlesource.com/gn",
            REVISION,
            &BuildContext::default(),
            &ws,
            &mut runner,
        )
        .unwrap();
        let Step::WriteFile { contents, .. } = &runner.steps[0] else {
            panic!("expected pkg-def write");
        };
        assert!(contents.contains("\"gn.exe\""));
        assert!(contents.contains(".versions/gn.exe.cipd_version"));
    }
}
