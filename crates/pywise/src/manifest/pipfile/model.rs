//! Data model types for the Pipfile schema.
//!
//! Packages can be specified as either a simple version string (`"*"`,
//! `">=1.0"`) or a table with extended fields
//! (`{version = ">=1.0", extras = ["security"]}`).

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level Pipfile structure.
#[derive(Debug, Default, Deserialize)]
pub struct Pipfile {
    /// Package index sources.
    #[serde(default)]
    pub source: Vec<PipfileSource>,

    /// Production dependencies.
    #[serde(default)]
    pub packages: BTreeMap<String, PipfilePackage>,

    /// Development dependencies.
    #[serde(rename = "dev-packages", default)]
    pub dev_packages: BTreeMap<String, PipfilePackage>,

    /// Python version requirements.
    pub requires: Option<PipfileRequires>,
}

/// A `[[source]]` entry.
#[derive(Debug, Deserialize)]
pub struct PipfileSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

impl PipfileSource {
    pub fn pypi() -> Self {
        Self {
            name: "pypi".to_owned(),
            url: "https://pypi.org/simple".to_owned(),
            verify_ssl: true,
        }
    }
}

/// A package dependency.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PipfilePackage {
    /// `requests = "*"` or `requests = ">=1.0"`.
    Simple(String),

    /// `requests = {version = ">=1.0", extras = ["security"]}`.
    Detailed(PipfilePackageDetail),
}

/// Extended package specification fields.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PipfilePackageDetail {
    pub version: Option<String>,

    #[serde(default)]
    pub extras: Vec<String>,

    /// PEP 508 environment markers.
    pub markers: Option<String>,

    /// Platform marker shorthand (e.g. `"== 'linux'"`).
    pub sys_platform: Option<String>,

    pub git: Option<String>,

    /// Git ref (branch, tag, or commit).
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,

    /// Local path to a package.
    pub path: Option<String>,

    /// Remote archive URL.
    pub file: Option<String>,

    #[serde(default)]
    pub editable: bool,
}

/// The `[requires]` section.
#[derive(Debug, Deserialize)]
pub struct PipfileRequires {
    /// e.g. `"3.12"`
    pub python_version: Option<String>,

    /// e.g. `"3.12.1"`
    pub python_full_version: Option<String>,
}

fn default_true() -> bool {
    true
}
