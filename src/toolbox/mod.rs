//! Side-effect capabilities behind one interface
//!
//! Network fetches, archive extraction and subprocesses go through the
//! `Toolbox` trait so the cache state machine and the bundle resolver can be
//! exercised against an in-memory fake.

pub mod local;

#[cfg(test)]
pub mod fake;

pub use local::LocalToolbox;

use crate::catalog::ArchiveKind;
use crate::error::{PrebuildError, PrebuildResult};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Variables removed from every child environment; both confuse the
/// package manager's own builds.
pub const STRIPPED_ENV_VARS: &[&str] = &["VCPKG_ROOT", "USE_CCACHE"];

/// A subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable path
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory (inherits when unset)
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Side effects the provisioning pipeline needs from its host
pub trait Toolbox {
    /// Download `url` into the file at `dest`
    fn fetch(&self, url: &str, dest: &Path) -> PrebuildResult<()>;

    /// Unpack `archive` into the directory `dest`
    fn extract(&self, archive: &Path, kind: ArchiveKind, dest: &Path) -> PrebuildResult<()>;

    /// Run a command to completion, capturing stdout and stderr
    fn run(&self, command: &CommandSpec) -> PrebuildResult<CommandOutput>;

    /// Human-readable implementation name for diagnostics
    fn name(&self) -> &'static str;
}

/// Run a command and fail with the full captured output on a non-zero exit
pub fn run_checked(toolbox: &dyn Toolbox, command: &CommandSpec) -> PrebuildResult<String> {
    debug!("Running: {}", command);
    let output = toolbox.run(command)?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(PrebuildError::ToolFailure {
            command: command.to_string(),
            code: output.code.unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeToolbox;
    use super::*;

    #[test]
    fn command_display_joins_args() {
        let cmd = CommandSpec::new("/opt/vcpkg/vcpkg")
            .arg("install")
            .arg("--triplet")
            .arg("x64-linux");
        assert_eq!(cmd.to_string(), "/opt/vcpkg/vcpkg install --triplet x64-linux");
    }

    #[test]
    fn run_checked_returns_stdout() {
        let toolbox = FakeToolbox::new();
        toolbox.push_output(CommandOutput {
            code: Some(0),
            stdout: "[]".to_string(),
            stderr: String::new(),
        });
        let out = run_checked(&toolbox, &CommandSpec::new("scanner")).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn run_checked_reports_tool_failure() {
        let toolbox = FakeToolbox::new();
        toolbox.push_output(CommandOutput {
            code: Some(2),
            stdout: "partial".to_string(),
            stderr: "boom".to_string(),
        });
        let cmd = CommandSpec::new("vcpkg").arg("install");
        let err = run_checked(&toolbox, &cmd).unwrap_err();
        match err {
            PrebuildError::ToolFailure {
                command,
                code,
                stdout,
                stderr,
            } => {
                assert_eq!(command, "vcpkg install");
                assert_eq!(code, 2);
                assert_eq!(stdout, "partial");
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected ToolFailure, got {other:?}"),
        }
    }

    #[test]
    fn signal_termination_is_failure() {
        let output = CommandOutput {
            code: None,
            ..Default::default()
        };
        assert!(!output.success());
    }
}
