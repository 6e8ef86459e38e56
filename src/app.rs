use anyhow::Result;

pub fn run(cli: crate::cli::Cli) -> Result<()> {
    match cli.cmd {
        crate::cli::Cmd::Run {
            repository,
            build_input,
            work_dir,
            dry_run,
        } => crate::tasks::run::run(&repository, build_input.as_deref(), work_dir, dry_run),
        crate::cli::Cmd::Doctor => crate::tasks::doctor::run(),
    }
}
