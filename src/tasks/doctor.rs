use crate::target::Target;
use anyhow::{bail, Result};

pub fn run() -> Result<()> {
    let host = Target::host()?;

    let mut tools = vec!["git", "cipd", "python3"];
    if host.is_mac() {
        tools.push("xcrun");
    }

    let mut ok = true;
    for tool in tools {
        if which::which(tool).is_err() {
            eprintln!("[FAIL] missing `{tool}` in PATH");
            ok = false;
        } else {
            eprintln!("[OK] {tool}");
        }
    }

    if !ok {
        bail!("doctor checks failed");
    }
    Ok(())
}
