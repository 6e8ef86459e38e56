//! Pinned toolchain fetch via the CIPD client: ninja everywhere, clang on
//! linux/mac, and a Linux sysroot for cross compiles.

use crate::runner::{Step, StepRunner};
use crate::target::Target;
use crate::util::paths::Workspace;
use anyhow::Result;

const NINJA_PACKAGE: &str = "infra/ninja/${platform}";
const NINJA_VERSION: &str = "version:1.8.2";
const CLANG_PACKAGE: &str = "fuchsia/third_party/clang/${platform}";
const CLANG_VERSION: &str = "integration";
const SYSROOT_PACKAGE: &str = "fuchsia/third_party/sysroot/linux";
const SYSROOT_VERSION: &str = "git_revision:c912d089c3d46d8982fdef76a50514cca79b6132";

pub fn ensure(host: Target, ws: &Workspace, runner: &mut dyn StepRunner) -> Result<()> {
    runner.run(Step::write_file(
        "cipd.ensure-file",
        ws.ensure_file(),
        ensure_file_contents(host),
    ))?;
    runner.run(Step::command(
        "cipd.ensure",
        "cipd",
        vec![
            "ensure".to_string(),
            "-root".to_string(),
            ws.cipd_dir().display().to_string(),
            "-ensure-file".to_string(),
            ws.ensure_file().display().to_string(),
        ],
    ))?;
    Ok(())
}

fn ensure_file_contents(host: Target) -> String {
    let mut lines = vec![format!("{NINJA_PACKAGE} {NINJA_VERSION}")];
    if host.is_linux() || host.is_mac() {
        lines.push(format!("{CLANG_PACKAGE} {CLANG_VERSION}"));
    }
    if host.is_linux() {
        lines.push("@Subdir sysroot".to_string());
        lines.push(format!("{SYSROOT_PACKAGE} {SYSROOT_VERSION}"));
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ReplayRunner;

    #[test]
    fn linux_ensure_file_lists_ninja_clang_and_sysroot() {
        let contents = ensure_file_contents(Target::parse("linux-amd64").unwrap());
        assert!(contents.contains("infra/ninja/${platform} version:1.8.2"));
        assert!(contents.contains("fuchsia/third_party/clang/${platform} integration"));
        assert!(contents.contains("@Subdir sysroot\nfuchsia/third_party/sysroot/linux"));
    }

    #[test]
    fn win_ensure_file_only_lists_ninja() {
        let contents = ensure_file_contents(Target::parse("win-amd64").unwrap());
        assert!(contents.contains("infra/ninja"));
        assert!(!contents.contains("clang"));
        assert!(!contents.contains("sysroot"));
    }

    #[test]
    fn ensure_writes_the_file_then_runs_cipd() {
        let ws = Workspace::new("/work");
        let mut runner = ReplayRunner::new();
        ensure(Target::parse("mac-arm64").unwrap(), &ws, &mut runner).unwrap();
        assert_eq!(runner.names(), vec!["cipd.ensure-file", "cipd.ensure"]);
    }
}
