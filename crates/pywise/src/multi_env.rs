//! Per-environment requirement files (`dev`, `staging`, `prod`, ...).
//!
//! Every environment gets a `requirements-<env>.txt` pinned to the currently
//! installed versions, and `pywise-multi-env.yml` ties them together with a
//! Python version and environment variables per environment.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::environment::InstalledPackage;
use crate::error::MultiEnvError;
use crate::normalize::normalize_name;

pub const CONFIG_FILE_NAME: &str = "pywise-multi-env.yml";

pub const DEFAULT_ENVIRONMENTS: &[&str] = &["dev", "staging", "prod"];

/// Added, unpinned, to the `dev` environment.
const DEV_EXTRAS: &[&str] = &["pytest", "black", "flake8", "mypy"];

/// Installer tooling that doesn't belong in a requirements file.
const SKIPPED: &[&str] = &["pip", "setuptools", "wheel"];

/// The content of `pywise-multi-env.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiEnvConfig {
    pub environments: BTreeMap<String, EnvironmentConfig>,
    pub project: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub environment_variables: BTreeMap<String, String>,
    pub python_version: String,
    pub requirements_file: String,
}

/// Files to write, relative to the project directory.
#[derive(Debug)]
pub struct MultiEnvPlan {
    pub config: MultiEnvConfig,
    pub requirements: Vec<(String, String)>,
}

impl MultiEnvPlan {
    pub fn new(
        project: &str,
        environments: &[String],
        packages: &[InstalledPackage],
        python_version: &str,
    ) -> Result<Self, MultiEnvError> {
        let mut config = MultiEnvConfig {
            environments: BTreeMap::new(),
            project: project.to_owned(),
        };
        let mut requirements = Vec::with_capacity(environments.len());

        for env in environments {
            let file_name = requirements_file_name(env);
            requirements.push((file_name.clone(), render_requirements(env, packages)?));
            config.environments.insert(
                env.clone(),
                EnvironmentConfig {
                    environment_variables: environment_variables(env),
                    python_version: python_version.to_owned(),
                    requirements_file: file_name,
                },
            );
        }

        Ok(Self {
            config,
            requirements,
        })
    }

    /// Write every file into `dir`, returning the paths written.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>, MultiEnvError> {
        let mut written = Vec::with_capacity(self.requirements.len() + 1);
        for (file_name, content) in &self.requirements {
            let path = dir.join(file_name);
            fs_err::write(&path, content)?;
            written.push(path);
        }

        let path = dir.join(CONFIG_FILE_NAME);
        let content = serde_yaml::to_string(&self.config).map_err(MultiEnvError::Serialize)?;
        fs_err::write(&path, content)?;
        written.push(path);

        Ok(written)
    }
}

pub fn requirements_file_name(env: &str) -> String {
    format!("requirements-{env}.txt")
}

/// Render `requirements-<env>.txt`.
pub fn render_requirements(
    env: &str,
    packages: &[InstalledPackage],
) -> Result<String, MultiEnvError> {
    let mut out = String::new();
    writeln!(out, "# {} environment", title_case(env))?;
    writeln!(out)?;

    let mut seen = Vec::with_capacity(packages.len());
    for package in packages {
        let name = package.normalized_name();
        if SKIPPED.contains(&name.as_str()) {
            continue;
        }
        writeln!(out, "{}=={}", package.name, package.version)?;
        seen.push(name);
    }

    if env == "dev" {
        for extra in DEV_EXTRAS {
            if !seen.contains(&normalize_name(extra)) {
                writeln!(out, "{extra}")?;
            }
        }
    }

    Ok(out)
}

/// Variables exported for `env`. Unknown environment names only get the
/// shared base.
pub fn environment_variables(env: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::from([
        ("PYTHONPATH".to_owned(), ".".to_owned()),
        ("PYTHONUNBUFFERED".to_owned(), "1".to_owned()),
    ]);
    let extra = match env {
        "dev" => Some(("True", "DEBUG")),
        "staging" => Some(("False", "INFO")),
        "prod" => Some(("False", "ERROR")),
        _ => None,
    };
    if let Some((debug, log_level)) = extra {
        vars.insert("DEBUG".to_owned(), debug.to_owned());
        vars.insert("LOG_LEVEL".to_owned(), log_level.to_owned());
    }
    vars
}

fn title_case(env: &str) -> String {
    let mut chars = env.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
