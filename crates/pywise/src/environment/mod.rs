//! The Python environment pywise is pointed at.
//!
//! Covers three concerns:
//! - [`EnvironmentKind`]: what kind of environment is active (conda, venv, ...)
//! - [`find_python`]: which interpreter to ask for installed packages
//! - [`inventory`]: the installed packages themselves

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ToolError;
use crate::tool::Tool;

pub mod inventory;

pub use inventory::{InstalledPackage, Inventory};

/// The kind of Python environment that is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Conda,
    Venv,
    Pipenv,
    Poetry,
    System,
}

impl EnvironmentKind {
    /// Detect the active environment from the process environment.
    pub fn from_env(cwd: &Path) -> Self {
        Self::detect(|key| std::env::var_os(key), cwd)
    }

    /// Detect the active environment using `lookup` to read variables.
    ///
    /// Conda wins over everything else; `pipenv shell` exports `VIRTUAL_ENV`
    /// too, so `PIPENV_ACTIVE` is checked before it. Poetry is only inferred
    /// from project files when no environment is active.
    pub fn detect(lookup: impl Fn(&str) -> Option<OsString>, cwd: &Path) -> Self {
        let is_set = |key: &str| lookup(key).is_some_and(|value| !value.is_empty());

        if is_set("CONDA_DEFAULT_ENV") || is_set("CONDA_PREFIX") {
            Self::Conda
        } else if is_set("PIPENV_ACTIVE") {
            Self::Pipenv
        } else if is_set("VIRTUAL_ENV") {
            Self::Venv
        } else if cwd.join("poetry.lock").is_file() || cwd.join("pyproject.toml").is_file() {
            Self::Poetry
        } else {
            Self::System
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conda => "conda",
            Self::Venv => "venv",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
            Self::System => "system",
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locate the Python interpreter to query.
///
/// Resolution order:
/// 1. `explicit` (the `--python` flag)
/// 2. the interpreter of the active virtualenv (`VIRTUAL_ENV`)
/// 3. the interpreter of the active conda environment (`CONDA_PREFIX`)
/// 4. `python3`, then `python`, on `PATH`
pub fn find_python(explicit: Option<&Path>) -> Result<Tool, ToolError> {
    if let Some(path) = explicit {
        return Ok(Tool::at(path));
    }

    let candidates = [
        std::env::var_os("VIRTUAL_ENV").map(|root| venv_python(Path::new(&root))),
        std::env::var_os("CONDA_PREFIX").map(|root| conda_python(Path::new(&root))),
    ];
    if let Some(python) = candidates.into_iter().flatten().find(|path| path.is_file()) {
        return Ok(Tool::at(python));
    }

    Tool::find("python3").or_else(|_| Tool::find("python"))
}

fn venv_python(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("Scripts").join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}

fn conda_python(root: &Path) -> PathBuf {
    if cfg!(windows) {
        root.join("python.exe")
    } else {
        root.join("bin").join("python")
    }
}
