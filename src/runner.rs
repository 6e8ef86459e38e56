//! Step execution.
//!
//! Every external effect of the pipeline (a command invocation or a
//! filesystem mutation) is a [`Step`] handed to a [`StepRunner`]. That keeps
//! the pipeline itself pure: given a host platform and a build context it
//! emits a deterministic, ordered trace of steps, and tests can replay that
//! trace without touching the system.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One externally-visible action, identified by a dot-separated step name
/// such as `release.linux-amd64.build`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Command {
        name: String,
        program: PathBuf,
        args: Vec<String>,
        cwd: Option<PathBuf>,
        env: Vec<(String, String)>,
        capture: bool,
    },
    WriteFile {
        name: String,
        path: PathBuf,
        contents: String,
    },
    RemoveTree {
        name: String,
        path: PathBuf,
    },
    CopyTree {
        name: String,
        from: PathBuf,
        to: PathBuf,
    },
    /// Runs nothing; exists so a decision (like "package is up-to-date")
    /// still shows up in the step trace.
    NoOp {
        name: String,
    },
}

/// Captured stdout of a step. Empty unless the step was a capturing command.
#[derive(Clone, Debug, Default)]
pub struct StepOutput {
    pub stdout: String,
}

impl Step {
    pub fn command<I, S>(name: impl Into<String>, program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Command {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
            capture: false,
        }
    }

    pub fn write_file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        Step::WriteFile {
            name: name.into(),
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn remove_tree(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Step::RemoveTree {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn copy_tree(
        name: impl Into<String>,
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
    ) -> Self {
        Step::CopyTree {
            name: name.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn no_op(name: impl Into<String>) -> Self {
        Step::NoOp { name: name.into() }
    }

    /// Run the command from this directory.
    pub fn cwd(mut self, dir: &Path) -> Self {
        if let Step::Command { cwd, .. } = &mut self {
            *cwd = Some(dir.to_path_buf());
        }
        self
    }

    /// Extend the command's environment.
    pub fn env(mut self, vars: &[(String, String)]) -> Self {
        if let Step::Command { env, .. } = &mut self {
            env.extend(vars.iter().cloned());
        }
        self
    }

    /// Capture the command's stdout instead of inheriting it.
    pub fn capture(mut self) -> Self {
        if let Step::Command { capture, .. } = &mut self {
            *capture = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Step::Command { name, .. }
            | Step::WriteFile { name, .. }
            | Step::RemoveTree { name, .. }
            | Step::CopyTree { name, .. }
            | Step::NoOp { name } => name,
        }
    }
}

pub trait StepRunner {
    fn run(&mut self, step: Step) -> Result<StepOutput>;
}

/// Executes steps against the real system. Any failing command aborts the
/// pipeline with the step name in the error; there is no retry.
pub struct HostRunner;

impl StepRunner for HostRunner {
    fn run(&mut self, step: Step) -> Result<StepOutput> {
        println!("[{}]", step.name());
        match step {
            Step::Command {
                name,
                program,
                args,
                cwd,
                env,
                capture,
            } => {
                let mut cmd = Command::new(&program);
                cmd.args(&args);
                if let Some(dir) = &cwd {
                    cmd.current_dir(dir);
                }
                cmd.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

                if capture {
                    let out = cmd
                        .stderr(Stdio::inherit())
                        .output()
                        .with_context(|| format!("failed to spawn `{}`", program.display()))?;
                    if !out.status.success() {
                        bail!("step `{}` failed: {}", name, out.status);
                    }
                    Ok(StepOutput {
                        stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    })
                } else {
                    let status = cmd
                        .status()
                        .with_context(|| format!("failed to spawn `{}`", program.display()))?;
                    if !status.success() {
                        bail!("step `{}` failed: {}", name, status);
                    }
                    Ok(StepOutput::default())
                }
            }
            Step::WriteFile {
                name,
                path,
                contents,
            } => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, contents)
                    .with_context(|| format!("step `{}`: write {}", name, path.display()))?;
                Ok(StepOutput::default())
            }
            Step::RemoveTree { name, path } => {
                if path.exists() {
                    std::fs::remove_dir_all(&path)
                        .with_context(|| format!("step `{}`: remove {}", name, path.display()))?;
                }
                Ok(StepOutput::default())
            }
            Step::CopyTree { name, from, to } => {
                copy_dir_all(&from, &to)
                    .with_context(|| format!("step `{}`: copy {}", name, from.display()))?;
                Ok(StepOutput::default())
            }
            Step::NoOp { .. } => Ok(StepOutput::default()),
        }
    }
}

fn copy_dir_all(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Prints every step without executing it. Capturing steps yield a fixed
/// placeholder so the rest of the plan can still unfold.
pub struct DryRunner;

const DRY_RUN_STDOUT: &str = "0000000000000000000000000000000000000000";

impl StepRunner for DryRunner {
    fn run(&mut self, step: Step) -> Result<StepOutput> {
        match &step {
            Step::Command { program, args, .. } => {
                println!("[{}] {} {}", step.name(), program.display(), args.join(" "));
            }
            Step::WriteFile { path, .. } => {
                println!("[{}] write {}", step.name(), path.display());
            }
            Step::RemoveTree { path, .. } => {
                println!("[{}] rmtree {}", step.name(), path.display());
            }
            Step::CopyTree { from, to, .. } => {
                println!("[{}] copy {} -> {}", step.name(), from.display(), to.display());
            }
            Step::NoOp { .. } => {
                println!("[{}]", step.name());
            }
        }
        let capture = matches!(&step, Step::Command { capture: true, .. });
        Ok(StepOutput {
            stdout: if capture {
                DRY_RUN_STDOUT.to_string()
            } else {
                String::new()
            },
        })
    }
}

/// Records the full step trace and answers capturing steps from a canned
/// `name -> stdout` table.
#[cfg(test)]
pub struct ReplayRunner {
    pub steps: Vec<Step>,
    outputs: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl ReplayRunner {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            outputs: std::collections::HashMap::new(),
        }
    }

    pub fn with_output(mut self, name: &str, stdout: &str) -> Self {
        self.outputs.insert(name.to_string(), stdout.to_string());
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }
}

#[cfg(test)]
impl StepRunner for ReplayRunner {
    fn run(&mut self, step: Step) -> Result<StepOutput> {
        let stdout = match &step {
            Step::Command { name, capture, .. } if *capture => {
                self.outputs.get(name).cloned().unwrap_or_default()
            }
            _ => String::new(),
        };
        self.steps.push(step);
        Ok(StepOutput { stdout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_builder_sets_cwd_env_capture() {
        let env = vec![("CC".to_string(), "clang".to_string())];
        let step = Step::command("git.fetch", "git", ["fetch", "--tags"])
            .cwd(Path::new("/work/gn"))
            .env(&env)
            .capture();
        match step {
            Step::Command {
                name,
                program,
                args,
                cwd,
                env,
                capture,
            } => {
                assert_eq!(name, "git.fetch");
                assert_eq!(program, PathBuf::from("git"));
                assert_eq!(args, vec!["fetch", "--tags"]);
                assert_eq!(cwd, Some(PathBuf::from("/work/gn")));
                assert_eq!(env[0].0, "CC");
                assert!(capture);
            }
            _ => panic!("expected command step"),
        }
    }

    #[test]
    fn replay_runner_serves_canned_output_for_capturing_steps() {
        let mut runner = ReplayRunner::new().with_output("git.rev-parse", "abc123\n");
        let out = runner
            .run(Step::command("git.rev-parse", "git", ["rev-parse", "HEAD"]).capture())
            .unwrap();
        assert_eq!(out.stdout, "abc123\n");

        // Non-capturing steps get no output even when the table has an entry.
        let out = runner
            .run(Step::command("git.rev-parse", "git", ["rev-parse", "HEAD"]))
            .unwrap();
        assert_eq!(out.stdout, "");
        assert_eq!(runner.names(), vec!["git.rev-parse", "git.rev-parse"]);
    }
}
