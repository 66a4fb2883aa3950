//! Installed-package inventory.
//!
//! Two sources are supported:
//! - `python -m pip inspect`, falling back to `pip list --format=json` on
//!   pip versions that predate `inspect` (no dependency edges in that case)
//! - a direct scan of a `site-packages` directory for `*.dist-info/METADATA`
//!   and `*.egg-info/PKG-INFO`, which needs no interpreter at all

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mailparse::MailHeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::normalize::{Requirement, normalize_name};
use crate::tool::Tool;

/// One installed distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    /// The distribution name as reported by its metadata.
    pub name: String,
    pub version: String,
    /// Normalized names of the runtime dependencies it declares.
    #[serde(skip)]
    pub requires: Vec<String>,
    pub editable: bool,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            requires: Vec::new(),
            editable: false,
        }
    }

    #[must_use]
    pub fn with_requires(mut self, requires: &[&str]) -> Self {
        self.requires = requires.iter().map(|name| normalize_name(name)).collect();
        self
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Where installed packages are read from.
#[derive(Debug, Clone)]
pub enum Inventory {
    /// Ask pip, via the given interpreter.
    Pip(Tool),
    /// Scan a `site-packages` directory.
    SitePackages(PathBuf),
}

impl Inventory {
    /// List installed packages, sorted by normalized name.
    pub async fn packages(&self) -> Result<Vec<InstalledPackage>> {
        let packages = match self {
            Self::Pip(python) => pip_packages(python).await?,
            Self::SitePackages(dir) => scan_site_packages(dir)?,
        };
        Ok(dedupe(packages))
    }

    /// Human-readable description of the source, for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Pip(python) => format!("pip ({})", python.program().display()),
            Self::SitePackages(dir) => format!("site-packages ({})", dir.display()),
        }
    }
}

/// Keep the first entry per normalized name and sort.
fn dedupe(packages: Vec<InstalledPackage>) -> Vec<InstalledPackage> {
    let mut by_name = BTreeMap::new();
    for package in packages {
        by_name.entry(package.normalized_name()).or_insert(package);
    }
    by_name.into_values().collect()
}

// ---------------------------------------------------------------------------
// pip
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PipInspectReport {
    installed: Vec<PipInspectEntry>,
}

#[derive(Debug, Deserialize)]
struct PipInspectEntry {
    metadata: PipInspectMetadata,
    #[serde(default)]
    direct_url: Option<DirectUrl>,
}

#[derive(Debug, Deserialize)]
struct PipInspectMetadata {
    name: String,
    version: String,
    #[serde(default)]
    requires_dist: Vec<String>,
}

/// The subset of PEP 610 `direct_url.json` we care about.
#[derive(Debug, Default, Deserialize)]
struct DirectUrl {
    #[serde(default)]
    dir_info: Option<DirInfo>,
}

#[derive(Debug, Default, Deserialize)]
struct DirInfo {
    #[serde(default)]
    editable: bool,
}

impl DirectUrl {
    fn is_editable(&self) -> bool {
        self.dir_info.as_ref().is_some_and(|info| info.editable)
    }
}

#[derive(Debug, Deserialize)]
struct PipListEntry {
    name: String,
    version: String,
    #[serde(default)]
    editable_project_location: Option<String>,
}

async fn pip_packages(python: &Tool) -> Result<Vec<InstalledPackage>> {
    match python
        .output(&["-m", "pip", "inspect", "--local"], None)
        .await
    {
        Ok(stdout) => parse_pip_inspect(&stdout).map_err(|err| {
            anyhow::Error::from(ToolError::Output {
                command: "pip inspect".to_owned(),
                err,
            })
        }),
        Err(ToolError::Failed { stderr, .. }) => {
            warn!("`pip inspect` is unavailable, falling back to `pip list` (no dependency information)");
            debug!("pip inspect stderr: {}", stderr.trim());
            let stdout = python
                .output(&["-m", "pip", "list", "--local", "--format=json"], None)
                .await
                .context("failed to list installed packages with pip")?;
            parse_pip_list(&stdout).map_err(|err| {
                anyhow::Error::from(ToolError::Output {
                    command: "pip list".to_owned(),
                    err,
                })
            })
        }
        Err(err) => Err(err).context("failed to query installed packages"),
    }
}

fn parse_pip_inspect(stdout: &str) -> Result<Vec<InstalledPackage>, serde_json::Error> {
    let report: PipInspectReport = serde_json::from_str(stdout)?;
    Ok(report
        .installed
        .into_iter()
        .map(|entry| InstalledPackage {
            requires: runtime_requirements(entry.metadata.requires_dist.iter().map(String::as_str)),
            editable: entry.direct_url.is_some_and(|url| url.is_editable()),
            name: entry.metadata.name,
            version: entry.metadata.version,
        })
        .collect())
}

fn parse_pip_list(stdout: &str) -> Result<Vec<InstalledPackage>, serde_json::Error> {
    let entries: Vec<PipListEntry> = serde_json::from_str(stdout)?;
    Ok(entries
        .into_iter()
        .map(|entry| InstalledPackage {
            editable: entry.editable_project_location.is_some(),
            ..InstalledPackage::new(entry.name, entry.version)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// site-packages scan
// ---------------------------------------------------------------------------

fn scan_site_packages(dir: &Path) -> Result<Vec<InstalledPackage>> {
    let mut packages = Vec::new();
    let entries = fs_err::read_dir(dir).context("failed to read site-packages directory")?;

    for entry in entries {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        let metadata_path = if file_name.ends_with(".dist-info") {
            path.join("METADATA")
        } else if file_name.ends_with(".egg-info") {
            // Either a directory holding PKG-INFO, or the metadata file itself.
            if path.is_dir() {
                path.join("PKG-INFO")
            } else {
                path.clone()
            }
        } else {
            continue;
        };

        if !metadata_path.is_file() {
            debug!("Skipping `{}`: no metadata file", path.display());
            continue;
        }

        // Old sdists wrote latin-1 metadata; the header parser copes with it.
        let content = match fs_err::read(&metadata_path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Skipping `{}`: {err}", path.display());
                continue;
            }
        };
        let Some(mut package) = parse_metadata(&content) else {
            warn!(
                "Skipping `{}`: malformed metadata or missing Name/Version",
                metadata_path.display()
            );
            continue;
        };

        let direct_url = path.join("direct_url.json");
        if direct_url.is_file() {
            package.editable = fs_err::read(&direct_url)
                .ok()
                .and_then(|content| serde_json::from_slice::<DirectUrl>(&content).ok())
                .is_some_and(|url| url.is_editable());
        }

        packages.push(package);
    }

    Ok(packages)
}

/// Parse the RFC 822 header block of a core metadata file.
fn parse_metadata(content: &[u8]) -> Option<InstalledPackage> {
    let (headers, _) = mailparse::parse_headers(content).ok()?;
    let name = headers.get_first_value("Name")?;
    let version = headers.get_first_value("Version")?;
    let requires_dist = headers.get_all_values("Requires-Dist");

    Some(InstalledPackage {
        requires: runtime_requirements(requires_dist.iter().map(String::as_str)),
        ..InstalledPackage::new(name.trim(), version.trim())
    })
}

/// Normalized names of the requirements that apply without any extra.
fn runtime_requirements<'a>(requires_dist: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = requires_dist
        .filter_map(|requirement| match Requirement::parse(requirement) {
            Ok(requirement) => Some(requirement),
            Err(err) => {
                debug!("Ignoring dependency: {err}");
                None
            }
        })
        .filter(|requirement| {
            requirement
                .marker
                .as_deref()
                .is_none_or(|marker| !mentions_extra(marker))
        })
        .map(|requirement| requirement.normalized_name())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Whether a marker expression tests the `extra` variable.
fn mentions_extra(marker: &str) -> bool {
    marker
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|token| token == "extra")
}
