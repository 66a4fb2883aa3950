//! Typed errors for the library layer.
//!
//! Command handlers wrap these in [`anyhow::Error`] with extra context; the
//! variants here carry enough detail to be useful on their own.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing a dependency manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Unsupported dependency file: `{}` (expected requirements*.txt, environment.yml, pyproject.toml or Pipfile)", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("Invalid requirement `{spec}`: {reason}")]
    InvalidRequirement { spec: String, reason: String },

    #[error("Failed to parse `{}`", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    #[error("Failed to parse `{}`", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        err: toml::de::Error,
    },

    #[error("`{}` does not declare any dependencies", .0.display())]
    NoDependencies(PathBuf),

    #[error("Refusing to overwrite the source file `{}`", .0.display())]
    OutputIsSource(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Failures invoking an external tool (`python`, `conda`, `docker`).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{0}` was not found on PATH")]
    NotFound(String),

    #[error("Failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        err: std::io::Error,
    },

    #[error("`{command}` exited with {status}{}", format_stderr(.stderr))]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to parse output of `{command}`")]
    Output {
        command: String,
        #[source]
        err: serde_json::Error,
    },
}

/// Invalid Dockerfile generation options.
#[derive(Debug, Error)]
pub enum DockerError {
    #[error("Invalid Python version `{0}` (expected `major.minor`, e.g. `3.11`)")]
    InvalidPythonVersion(String),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Failures producing the multi-environment files.
#[derive(Debug, Error)]
pub enum MultiEnvError {
    #[error("Failed to serialize `pywise-multi-env.yml`")]
    Serialize(#[source] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Failures loading `.pywise.yml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("PYWISE_CONFIG is set to `{}` but the file does not exist", .0.display())]
    MissingExplicit(PathBuf),

    #[error("Failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("Failed to parse `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}
