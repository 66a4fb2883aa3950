//! Dependency manifests and conversion between them.
//!
//! Every supported file is read into a format-neutral [`Manifest`] and
//! written back out by the target format's writer:
//!
//! - `pip`: `requirements.txt`
//! - `conda`: `environment.yml`
//! - `poetry`: `pyproject.toml` (`[tool.poetry]`; PEP 621 `[project]` is
//!   accepted on input)
//! - `pipenv`: `Pipfile`

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;
use crate::normalize::Requirement;

pub mod conda;
pub mod pipfile;
pub mod pyproject;
pub mod requirements;

pub use conda::{CondaDependency, CondaEnvironment};

/// A dependency file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `requirements.txt`
    Pip,
    /// `environment.yml`
    Conda,
    /// `pyproject.toml` with `[tool.poetry]`
    Poetry,
    /// `Pipfile`
    Pipenv,
}

impl Format {
    /// Infer the format of `path` from its file name.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let unsupported = || ManifestError::UnsupportedFile(path.to_path_buf());
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(unsupported)?;

        match file_name {
            "Pipfile" => Ok(Self::Pipenv),
            "pyproject.toml" => Ok(Self::Poetry),
            name if name.ends_with(".txt") || name.ends_with(".in") => Ok(Self::Pip),
            name if name.ends_with(".yml") || name.ends_with(".yaml") => Ok(Self::Conda),
            _ => Err(unsupported()),
        }
    }

    /// The conventional file name for this format.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Pip => "requirements.txt",
            Self::Conda => "environment.yml",
            Self::Poetry => "pyproject.toml",
            Self::Pipenv => "Pipfile",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pip => "pip",
            Self::Conda => "conda",
            Self::Poetry => "poetry",
            Self::Pipenv => "pipenv",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format-neutral content of a dependency file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// The format this manifest was read from.
    pub format: Format,
    /// Project or environment name, when the source has one.
    pub name: Option<String>,
    /// Python requirement as a PEP 440 specifier (e.g. `>=3.9`, `==3.11.*`).
    pub python: Option<String>,
    /// Conda channels, in priority order.
    pub channels: Vec<String>,
    pub packages: Vec<Requirement>,
    pub dev_packages: Vec<Requirement>,
}

impl Manifest {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            name: None,
            python: None,
            channels: Vec::new(),
            packages: Vec::new(),
            dev_packages: Vec::new(),
        }
    }

    /// Read a manifest, inferring its format from the file name.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let format = Format::from_path(path)?;
        let content = fs_err::read_to_string(path)?;
        match format {
            Format::Pip => requirements::parse(&content),
            Format::Conda => conda::parse(&content, path),
            Format::Poetry => pyproject::parse(&content, path),
            Format::Pipenv => pipfile::parse(&content, path),
        }
    }

    /// Render this manifest in `format`.
    ///
    /// Development packages are only written when `include_dev` is set, or
    /// when the target has a dedicated section for them (poetry, pipenv).
    pub fn render(&self, format: Format, include_dev: bool) -> Result<String, ManifestError> {
        match format {
            Format::Pip => requirements::render(self, include_dev),
            Format::Conda => conda::render(self, include_dev),
            Format::Poetry => pyproject::render(self),
            Format::Pipenv => pipfile::render(self),
        }
    }

    /// Number of packages across both sections.
    pub fn len(&self) -> usize {
        self.packages.len() + self.dev_packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.dev_packages.is_empty()
    }
}

/// The result of a format migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub source_format: Format,
    pub target_format: Format,
    pub output: PathBuf,
    pub packages_converted: usize,
}

/// Convert `source` into `target` format, writing to `output` (or the
/// target's conventional file name next to `source`).
pub fn migrate(
    source: &Path,
    target: Format,
    output: Option<&Path>,
    include_dev: bool,
) -> Result<Migration, ManifestError> {
    let manifest = Manifest::read(source)?;
    if manifest.is_empty() {
        return Err(ManifestError::NoDependencies(source.to_path_buf()));
    }

    let output = match output {
        Some(output) => output.to_path_buf(),
        None => source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(target.default_file_name()),
    };
    if same_file(source, &output) {
        return Err(ManifestError::OutputIsSource(output));
    }

    let content = manifest.render(target, include_dev)?;
    fs_err::write(&output, content)?;

    let packages_converted = if include_dev || matches!(target, Format::Poetry | Format::Pipenv) {
        manifest.len()
    } else {
        manifest.packages.len()
    };

    Ok(Migration {
        source_format: manifest.format,
        target_format: target,
        output,
        packages_converted,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs_err::canonicalize(a), fs_err::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Render `key` as a TOML key, quoting it unless it is a bare key.
pub(crate) fn toml_key(key: &str) -> String {
    if !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        key.to_owned()
    } else {
        toml_string(key)
    }
}

/// Render `value` as a TOML basic string.
pub(crate) fn toml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Extract a `major.minor` version from a Python specifier, if any.
///
/// `>=3.9` -> `3.9`, `==3.11.*` -> `3.11`, `^3.10` -> `3.10`.
pub fn python_version_hint(specifier: &str) -> Option<String> {
    let start = specifier.find(|c: char| c.is_ascii_digit())?;
    let version: Vec<&str> = specifier[start..]
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .next()?
        .split('.')
        .filter(|part| !part.is_empty())
        .take(2)
        .collect();
    (!version.is_empty()).then(|| version.join("."))
}
