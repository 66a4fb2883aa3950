//! `.pywise.yml` discovery and deserialization.
//!
//! Respects `PYWISE_CONFIG` (explicit path) and walks up at most
//! [`MAX_DEPTH`] parent directories from the working directory looking for
//! the file. Every section and key is optional; unknown keys are rejected so
//! that typos surface instead of silently doing nothing.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::SettingsError;
use crate::resolver::Strategy;

/// Maximum number of parent directories searched for a config file.
pub const MAX_DEPTH: usize = 3;

/// The configuration file name.
pub const CONFIG_FILE_NAME: &str = ".pywise.yml";

/// Top-level `.pywise.yml` structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub detect: DetectSettings,
    pub resolve: ResolveSettings,
    pub docker: DockerSettings,
}

/// The `detect:` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectSettings {
    /// Packages never reported as primary.
    pub exclude_packages: Vec<String>,
    /// Report development tools (pytest, black, ...) as primary packages.
    pub include_dev: bool,
}

/// The `resolve:` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveSettings {
    pub strategy: Option<Strategy>,
    /// Extra packages to source from conda.
    pub prefer_conda: Vec<String>,
    /// Extra packages to source from pip.
    pub prefer_pip: Vec<String>,
}

/// The `docker:` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockerSettings {
    pub base_image: Option<String>,
    pub multi_stage: bool,
    pub optimize_layers: bool,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            base_image: None,
            multi_stage: false,
            optimize_layers: true,
        }
    }
}

impl Settings {
    /// Parse settings from the given path.
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let content = fs_err::read_to_string(path).map_err(|err| SettingsError::Read {
            path: path.to_path_buf(),
            err,
        })?;
        Self::from_yaml(&content, path)
    }

    fn from_yaml(content: &str, path: &Path) -> Result<Self, SettingsError> {
        // An empty file is a valid, empty configuration.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|err| SettingsError::Parse {
            path: path.to_path_buf(),
            err,
        })
    }

    /// Load settings for a command.
    ///
    /// Resolution order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. `PYWISE_CONFIG`
    /// 3. `.pywise.yml` in `start_dir` or one of its parents
    ///
    /// Returns the defaults when nothing is found.
    pub fn load(explicit: Option<&Path>, start_dir: &Path) -> Result<Self, SettingsError> {
        match find_config(explicit, start_dir)? {
            Some(path) => {
                debug!("Loading settings from `{}`", path.display());
                Self::from_path(&path)
            }
            None => {
                debug!("No {CONFIG_FILE_NAME} found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Locate the configuration file, if any.
pub fn find_config(
    explicit: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<PathBuf>, SettingsError> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(explicit) = env::var_os("PYWISE_CONFIG") {
        let path = PathBuf::from(explicit);
        if path.is_file() {
            return Ok(Some(path));
        }
        return Err(SettingsError::MissingExplicit(path));
    }

    let mut current = start_dir.to_path_buf();
    for _ in 0..=MAX_DEPTH {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(Some(candidate));
        }
        if !current.pop() {
            break;
        }
    }

    Ok(None)
}
