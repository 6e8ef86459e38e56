//! Compiler/linker environment for a given target.

use crate::runner::{Step, StepRunner};
use crate::target::Target;
use anyhow::Result;
use std::path::Path;

/// Environment variables for compiling GN (and rpmalloc) for `target`.
///
/// Linux links libstdc++ statically against the fetched sysroot; mac asks
/// Xcode for its SDK path and links the fetched libc++ instead of the
/// system one; Windows builds with whatever MSVC environment the caller
/// has set up, so nothing is added.
pub fn compilation_env(
    target: Target,
    cipd_dir: &Path,
    runner: &mut dyn StepRunner,
) -> Result<Vec<(String, String)>> {
    let triple = format!("--target={}", target.triple());
    let env = if target.is_linux() {
        let sysroot = format!("--sysroot={}", cipd_dir.join("sysroot").display());
        vec![
            ("CC".to_string(), cipd_dir.join("bin/clang").display().to_string()),
            ("CXX".to_string(), cipd_dir.join("bin/clang++").display().to_string()),
            ("AR".to_string(), cipd_dir.join("bin/llvm-ar").display().to_string()),
            ("CFLAGS".to_string(), format!("{triple} {sysroot}")),
            (
                "LDFLAGS".to_string(),
                format!("{triple} {sysroot} -static-libstdc++"),
            ),
        ]
    } else if target.is_mac() {
        let sdk_path = runner
            .run(
                Step::command("xcrun", "xcrun", ["--show-sdk-path"]).capture(),
            )?
            .stdout
            .trim()
            .to_string();
        let sysroot = format!("--sysroot={sdk_path}");
        let stdlib = cipd_dir.join("lib/libc++.a");
        vec![
            ("CC".to_string(), cipd_dir.join("bin/clang").display().to_string()),
            ("CXX".to_string(), cipd_dir.join("bin/clang++").display().to_string()),
            ("AR".to_string(), cipd_dir.join("bin/llvm-ar").display().to_string()),
            ("CFLAGS".to_string(), format!("{triple} {sysroot}")),
            (
                "LDFLAGS".to_string(),
                format!("{triple} {sysroot} -nostdlib++ {}", stdlib.display()),
            ),
        ]
    } else {
        Vec::new()
    };
    Ok(env)
}
