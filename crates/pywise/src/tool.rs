//! Invocation of external tools (`python`, `conda`, `docker`).
//!
//! pywise never reimplements these tools; it locates them on `PATH` and
//! runs them as subprocesses on the tokio runtime.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;

/// An external executable.
#[derive(Debug, Clone)]
pub struct Tool {
    program: PathBuf,
}

/// The outcome of a tool run whose output was streamed to the terminal.
#[derive(Debug, Clone, Copy)]
pub struct ToolStatus {
    /// The process exit code; `1` when it was terminated by a signal.
    pub exit_code: u8,
}

impl ToolStatus {
    pub fn success(self) -> bool {
        self.exit_code == 0
    }
}

impl Tool {
    /// Locate `name` on `PATH`.
    pub fn find(name: &str) -> Result<Self, ToolError> {
        which::which(name)
            .map(|program| Self { program })
            .map_err(|_| ToolError::NotFound(name.to_owned()))
    }

    /// Use the executable at `path` as-is.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            program: path.into(),
        }
    }

    /// Whether `name` is on `PATH` and answers `--version`.
    pub async fn is_available(name: &str) -> bool {
        match Self::find(name) {
            Ok(tool) => tool.output(&["--version"], None).await.is_ok(),
            Err(_) => false,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command<S: AsRef<OsStr>>(&self, args: &[S], cwd: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        command
    }

    /// The command line, for logs and error messages.
    fn command_line<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(args.iter().map(|arg| arg.as_ref().to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the tool and capture its stdout. A non-zero exit is an error.
    pub async fn output<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<String, ToolError> {
        let command_line = self.command_line(args);
        debug!("Running `{command_line}`");

        let output = self
            .command(args, cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| ToolError::Spawn {
                program: self.program.display().to_string(),
                err,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                command: command_line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run the tool with inherited stdio and report its exit code.
    pub async fn stream<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        cwd: Option<&Path>,
    ) -> Result<ToolStatus, ToolError> {
        debug!("Running `{}`", self.command_line(args));

        let status = self
            .command(args, cwd)
            .status()
            .await
            .map_err(|err| ToolError::Spawn {
                program: self.program.display().to_string(),
                err,
            })?;

        let exit_code = status
            .code()
            .and_then(|code| u8::try_from(code).ok())
            .unwrap_or(1);
        Ok(ToolStatus { exit_code })
    }
}
