use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Upstream GN repository; overridable with `--repository`.
pub const DEFAULT_REPOSITORY: &str = "https://gn.googlesource.com/gn";

#[derive(Parser)]
#[command(name = "gn-recipe")]
#[command(about = "Check out, build, test and publish the GN meta-build tool")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Run the full checkout/build/test/publish pipeline.
    Run {
        /// Git repository to build GN from.
        #[arg(long, default_value = DEFAULT_REPOSITORY)]
        repository: String,

        /// JSON file describing the triggering build (commit, pending
        /// patches, builder project). Missing file means a plain CI build
        /// of the default branch.
        #[arg(long, value_name = "PATH")]
        build_input: Option<PathBuf>,

        /// Directory the pipeline checks out and builds in.
        /// Defaults to the current directory.
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        /// Print every step instead of executing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that the external tools the pipeline invokes are on PATH.
    Doctor,
}
