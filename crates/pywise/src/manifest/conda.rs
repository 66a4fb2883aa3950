//! `environment.yml` reading and writing.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ManifestError;
use crate::manifest::{Format, Manifest, requirements};
use crate::normalize::{Requirement, normalize_name};

/// Channels used when the source doesn't name any.
pub const DEFAULT_CHANNELS: &[&str] = &["conda-forge", "defaults"];

/// The schema of a conda `environment.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondaEnvironment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<CondaDependency>,
}

/// An entry of `dependencies:`; either a match spec or the pip subsection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CondaDependency {
    Package(String),
    Pip { pip: Vec<String> },
}

impl CondaEnvironment {
    /// Build an environment from conda match specs and pip requirements.
    ///
    /// `pip` itself is added to the conda packages whenever there is a pip
    /// subsection, so conda installs the tool that will process it.
    pub fn new(
        name: impl Into<String>,
        channels: Vec<String>,
        conda: Vec<String>,
        pip: Vec<String>,
    ) -> Self {
        let mut dependencies: Vec<CondaDependency> =
            conda.into_iter().map(CondaDependency::Package).collect();
        if !pip.is_empty() {
            let has_pip = dependencies.iter().any(|dependency| {
                matches!(dependency, CondaDependency::Package(spec) if spec == "pip")
            });
            if !has_pip {
                dependencies.push(CondaDependency::Package("pip".to_owned()));
            }
            dependencies.push(CondaDependency::Pip { pip });
        }
        Self {
            name: Some(name.into()),
            channels,
            dependencies,
        }
    }

    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ManifestError> {
        serde_yaml::from_str(content).map_err(|err| ManifestError::Yaml {
            path: path.to_path_buf(),
            err,
        })
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        serde_yaml::to_string(self).map_err(|err| ManifestError::Yaml {
            path: "environment.yml".into(),
            err,
        })
    }

    /// The conda match specs, in file order.
    pub fn conda_packages(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(|dependency| match dependency {
            CondaDependency::Package(spec) => Some(spec.as_str()),
            CondaDependency::Pip { .. } => None,
        })
    }

    /// The entries of the pip subsection, if any.
    pub fn pip_packages(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter_map(|dependency| match dependency {
                CondaDependency::Pip { pip } => Some(pip.iter().map(String::as_str)),
                CondaDependency::Package(_) => None,
            })
            .flatten()
    }
}

pub(crate) fn parse(content: &str, path: &Path) -> Result<Manifest, ManifestError> {
    let environment = CondaEnvironment::from_yaml(content, path)?;

    let mut manifest = Manifest::new(Format::Conda);
    manifest.name = environment.name.clone();
    manifest.channels = environment.channels.clone();

    for spec in environment.conda_packages() {
        let requirement = Requirement::from_conda(spec)?;
        match requirement.normalized_name().as_str() {
            "python" => {
                manifest.python =
                    Some(requirement.specifier).filter(|specifier| !specifier.is_empty());
            }
            // Only there to install the pip subsection.
            "pip" => {}
            _ => manifest.packages.push(requirement),
        }
    }

    for line in environment.pip_packages() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('-') {
            debug!("Skipping pip option: {line}");
            continue;
        }
        manifest.packages.push(requirements::parse_line(line)?);
    }

    Ok(manifest)
}

/// Requirements conda can't express (extras, markers, URLs, `~=`) go to the
/// pip subsection.
pub(crate) fn render(manifest: &Manifest, include_dev: bool) -> Result<String, ManifestError> {
    let mut conda = Vec::new();
    let mut pip = Vec::new();

    if let Some(python) = &manifest.python {
        conda.push(Requirement {
            specifier: python.clone(),
            ..Requirement::any("python")
        }
        .to_conda_spec("python"));
    }

    let dev = if include_dev {
        manifest.dev_packages.as_slice()
    } else {
        &[]
    };
    for requirement in manifest.packages.iter().chain(dev) {
        if matches!(normalize_name(&requirement.name).as_str(), "python" | "pip") {
            continue;
        }
        if requirement.is_conda_expressible() && !requirement.editable {
            conda.push(requirement.to_conda_spec(&requirement.name));
        } else {
            pip.push(requirement.to_string());
        }
    }

    let channels = if manifest.channels.is_empty() {
        DEFAULT_CHANNELS.iter().map(|&channel| channel.to_owned()).collect()
    } else {
        manifest.channels.clone()
    };
    let name = manifest.name.as_deref().unwrap_or("converted-env");

    CondaEnvironment::new(name, channels, conda, pip).to_yaml()
}
