//! `Pipfile` reading and writing.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ManifestError;
use crate::manifest::{Format, Manifest, python_version_hint};
use crate::normalize::Requirement;

pub mod model;
mod writer;

pub use model::{Pipfile, PipfilePackage, PipfilePackageDetail, PipfileRequires, PipfileSource};

pub(crate) fn parse(content: &str, path: &Path) -> Result<Manifest, ManifestError> {
    let pipfile: Pipfile = toml::from_str(content).map_err(|err| ManifestError::Toml {
        path: path.to_path_buf(),
        err,
    })?;

    let mut manifest = Manifest::new(Format::Pipenv);
    manifest.python = pipfile.requires.as_ref().and_then(|requires| {
        requires
            .python_full_version
            .as_ref()
            .map(|version| format!("=={version}"))
            .or_else(|| {
                requires
                    .python_version
                    .as_ref()
                    .map(|version| format!("=={version}.*"))
            })
    });
    manifest.packages = to_requirements(pipfile.packages);
    manifest.dev_packages = to_requirements(pipfile.dev_packages);
    Ok(manifest)
}

pub(crate) fn render(manifest: &Manifest) -> Result<String, ManifestError> {
    let pipfile = Pipfile {
        source: vec![PipfileSource::pypi()],
        packages: from_requirements(&manifest.packages),
        dev_packages: from_requirements(&manifest.dev_packages),
        requires: manifest
            .python
            .as_deref()
            .and_then(python_version_hint)
            .map(|version| PipfileRequires {
                python_version: Some(version),
                python_full_version: None,
            }),
    };
    Ok(pipfile.to_toml_string()?)
}

fn to_requirements(packages: BTreeMap<String, PipfilePackage>) -> Vec<Requirement> {
    packages
        .into_iter()
        .map(|(name, package)| match package {
            PipfilePackage::Simple(version) => Requirement {
                specifier: specifier(&version),
                ..Requirement::any(name)
            },
            PipfilePackage::Detailed(detail) => {
                let marker = match (detail.markers, detail.sys_platform) {
                    (Some(markers), Some(platform)) => {
                        Some(format!("({markers}) and sys_platform {platform}"))
                    }
                    (Some(markers), None) => Some(markers),
                    (None, Some(platform)) => Some(format!("sys_platform {platform}")),
                    (None, None) => None,
                };
                let url = if let Some(git) = detail.git {
                    Some(match detail.git_ref {
                        Some(git_ref) => format!("git+{git}@{git_ref}"),
                        None => format!("git+{git}"),
                    })
                } else {
                    detail.file.or(detail.path)
                };
                Requirement {
                    name,
                    extras: detail.extras,
                    specifier: detail.version.as_deref().map(specifier).unwrap_or_default(),
                    marker,
                    url,
                    editable: detail.editable,
                }
            }
        })
        .collect()
}

/// `"*"` means any version.
fn specifier(version: &str) -> String {
    let version: String = version.split_whitespace().collect();
    if version == "*" { String::new() } else { version }
}

fn from_requirements(requirements: &[Requirement]) -> BTreeMap<String, PipfilePackage> {
    requirements
        .iter()
        .map(|requirement| (requirement.name.clone(), to_package(requirement)))
        .collect()
}

fn to_package(requirement: &Requirement) -> PipfilePackage {
    let version = if requirement.specifier.is_empty() {
        "*".to_owned()
    } else {
        requirement.specifier.clone()
    };

    if requirement.extras.is_empty()
        && requirement.marker.is_none()
        && requirement.url.is_none()
        && !requirement.editable
    {
        return PipfilePackage::Simple(version);
    }

    let mut detail = PipfilePackageDetail {
        extras: requirement.extras.clone(),
        markers: requirement.marker.clone(),
        editable: requirement.editable,
        ..PipfilePackageDetail::default()
    };
    match requirement.url.as_deref() {
        Some(url) => {
            if let Some(git) = url.strip_prefix("git+") {
                let (git, git_ref) = split_git_ref(git);
                detail.git = Some(git.to_owned());
                detail.git_ref = git_ref.map(str::to_owned);
            } else if url.contains("://") {
                detail.file = Some(url.to_owned());
            } else {
                detail.path = Some(url.to_owned());
            }
        }
        None => detail.version = Some(version),
    }
    PipfilePackage::Detailed(detail)
}

/// Split `https://host/repo.git@v1.0` into the repository and its ref.
///
/// An `@` followed by a path segment belongs to the URL (`ssh://git@host/...`).
fn split_git_ref(url: &str) -> (&str, Option<&str>) {
    match url.rsplit_once('@') {
        Some((repo, git_ref)) if !git_ref.contains('/') && repo.contains("://") => {
            (repo, Some(git_ref))
        }
        _ => (url, None),
    }
}
