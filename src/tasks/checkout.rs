//! Git checkout of the GN source at the requested ref, with any pending
//! Gerrit patches cherry-picked on top.

use crate::context::BuildContext;
use crate::runner::{Step, StepRunner};
use crate::util::paths::Workspace;
use anyhow::Result;

/// Returns the revision (`git rev-parse HEAD`) of the checkout, before any
/// cherry-picks.
pub fn checkout(
    repository: &str,
    ctx: &BuildContext,
    ws: &Workspace,
    runner: &mut dyn StepRunner,
) -> Result<String> {
    let src = ws.src_dir();

    runner.run(Step::command(
        "git.init",
        "git",
        vec!["init".to_string(), src.display().to_string()],
    ))?;

    // Fetch tags so `git describe` works in the GN build.
    runner.run(
        Step::command(
            "git.fetch",
            "git",
            ["fetch", "--tags", repository, ctx.fetch_ref()],
        )
        .cwd(&src),
    )?;
    runner.run(Step::command("git.checkout", "git", ["checkout", "FETCH_HEAD"]).cwd(&src))?;

    let revision = runner
        .run(
            Step::command("git.rev-parse", "git", ["rev-parse", "HEAD"])
                .cwd(&src)
                .capture(),
        )?
        .stdout
        .trim()
        .to_string();

    for change in &ctx.gerrit_changes {
        let suffix = format!("{}/{}", change.change, change.patchset);
        runner.run(
            Step::command(
                format!("git.fetch {suffix}"),
                "git",
                vec![
                    "fetch".to_string(),
                    repository.to_string(),
                    change.fetch_ref(),
                ],
            )
            .cwd(&src),
        )?;
        runner.run(
            Step::command(
                format!("git.cherry-pick {suffix}"),
                "git",
                ["cherry-pick", "FETCH_HEAD"],
            )
            .cwd(&src),
        )?;
    }

    Ok(revision)
}
