//! `pyproject.toml` reading and writing.
//!
//! Poetry's `[tool.poetry]` tables are read and written. PEP 621 `[project]`
//! metadata is also accepted on input, along with `[dependency-groups]`.

use std::fmt::Write;
use std::path::Path;

use toml::{Table, Value};
use tracing::warn;

use crate::error::ManifestError;
use crate::manifest::{Format, Manifest, toml_key, toml_string};
use crate::normalize::{Requirement, normalize_name};

pub(crate) fn parse(content: &str, path: &Path) -> Result<Manifest, ManifestError> {
    let document: Table = toml::from_str(content).map_err(|err| ManifestError::Toml {
        path: path.to_path_buf(),
        err,
    })?;

    let mut manifest = Manifest::new(Format::Poetry);

    if let Some(project) = document.get("project").and_then(Value::as_table) {
        manifest.name = string(project, "name");
        manifest.python = string(project, "requires-python");
        manifest.packages = pep508_list(project.get("dependencies"))?;
        if let Some(optional) = project.get("optional-dependencies").and_then(Value::as_table) {
            manifest.dev_packages.extend(pep508_list(optional.get("dev"))?);
        }
    }

    if let Some(groups) = document.get("dependency-groups").and_then(Value::as_table) {
        manifest.dev_packages.extend(pep508_list(groups.get("dev"))?);
    }

    if let Some(poetry) = document
        .get("tool")
        .and_then(|tool| tool.get("poetry"))
        .and_then(Value::as_table)
    {
        if manifest.name.is_none() {
            manifest.name = string(poetry, "name");
        }
        if let Some(dependencies) = poetry.get("dependencies").and_then(Value::as_table) {
            for (name, value) in dependencies {
                if name == "python" {
                    if manifest.python.is_none() {
                        manifest.python = value.as_str().map(poetry_to_pep440);
                    }
                    continue;
                }
                manifest.packages.extend(poetry_requirement(name, value));
            }
        }

        // Poetry < 1.2 used `dev-dependencies`; newer versions use groups.
        let legacy = poetry.get("dev-dependencies").and_then(Value::as_table);
        let groups = poetry
            .get("group")
            .and_then(Value::as_table)
            .into_iter()
            .flat_map(|groups| groups.values())
            .filter_map(|group| group.get("dependencies").and_then(Value::as_table));
        for dependencies in legacy.into_iter().chain(groups) {
            for (name, value) in dependencies {
                manifest.dev_packages.extend(poetry_requirement(name, value));
            }
        }
    }

    Ok(manifest)
}

fn string(table: &Table, key: &str) -> Option<String> {
    table.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// A list of PEP 508 strings; non-string entries (`{include-group = ...}`) are skipped.
fn pep508_list(value: Option<&Value>) -> Result<Vec<Requirement>, ManifestError> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(Requirement::parse)
        .collect()
}

/// Convert a Poetry dependency entry. Returns `None` for entries we can't
/// represent, such as multiple-constraint arrays.
fn poetry_requirement(name: &str, value: &Value) -> Option<Requirement> {
    match value {
        Value::String(constraint) => Some(Requirement {
            specifier: poetry_to_pep440(constraint),
            ..Requirement::any(name)
        }),
        Value::Table(table) => {
            let url = match (string(table, "git"), string(table, "path"), string(table, "url")) {
                (Some(git), _, _) => {
                    let reference = ["rev", "tag", "branch"]
                        .iter()
                        .find_map(|key| string(table, key));
                    Some(match reference {
                        Some(reference) => format!("git+{git}@{reference}"),
                        None => format!("git+{git}"),
                    })
                }
                (None, Some(path), _) => Some(path),
                (None, None, url) => url,
            };
            let extras = table
                .get("extras")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect();
            let marker = match (string(table, "markers"), string(table, "python")) {
                (Some(markers), _) => Some(markers),
                (None, Some(python)) => Some(python_marker(&poetry_to_pep440(&python))),
                (None, None) => None,
            };
            Some(Requirement {
                name: name.to_owned(),
                extras,
                specifier: string(table, "version")
                    .map(|version| poetry_to_pep440(&version))
                    .unwrap_or_default(),
                marker,
                url,
                editable: table
                    .get("develop")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            })
        }
        _ => {
            warn!("Skipping `{name}`: unsupported Poetry dependency declaration");
            None
        }
    }
}

/// `>=3.8,<4.0` -> `python_version >= '3.8' and python_version < '4.0'`
fn python_marker(specifier: &str) -> String {
    specifier
        .split(',')
        .filter_map(|clause| {
            let operator_end = clause.find(|c: char| c.is_ascii_digit())?;
            let (operator, version) = clause.split_at(operator_end);
            let operator = if operator.is_empty() { "==" } else { operator };
            Some(format!("python_version {operator} '{version}'"))
        })
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Convert a Poetry version constraint to a PEP 440 specifier.
///
/// `^1.2.3` -> `>=1.2.3,<2.0.0`, `~1.2` -> `>=1.2,<1.3`, `1.2.3` -> `==1.2.3`,
/// `*` -> any. Constraints that already use PEP 440 operators pass through.
pub fn poetry_to_pep440(constraint: &str) -> String {
    constraint
        .split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty() && *clause != "*")
        .map(|clause| {
            if let Some(version) = clause.strip_prefix('^') {
                caret(version.trim())
            } else if let Some(version) = clause.strip_prefix('~').filter(|v| !v.starts_with('=')) {
                tilde(version.trim())
            } else if clause.starts_with(|c: char| c.is_ascii_digit()) {
                format!("=={clause}")
            } else {
                clause.split_whitespace().collect()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn parts(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map_while(|part| part.parse().ok())
        .collect()
}

/// Bump the component at `index`, zeroing the ones after it.
fn bump(parts: &[u64], index: usize) -> String {
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| match i.cmp(&index) {
            std::cmp::Ordering::Less => part.to_string(),
            std::cmp::Ordering::Equal => part.saturating_add(1).to_string(),
            std::cmp::Ordering::Greater => "0".to_owned(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// `^` allows changes that don't modify the left-most non-zero component.
fn caret(version: &str) -> String {
    let parts = parts(version);
    if parts.is_empty() {
        return format!(">={version}");
    }
    let index = parts
        .iter()
        .position(|&part| part != 0)
        .unwrap_or(parts.len() - 1);
    let upper = if parts.len() == 1 {
        bump(&[parts[0], 0], 0)
    } else {
        bump(&parts, index)
    };
    format!(">={version},<{upper}")
}

/// `~` allows patch-level changes, or minor-level with only a major version.
fn tilde(version: &str) -> String {
    let parts = parts(version);
    let upper = match parts.len() {
        0 => return format!(">={version}"),
        1 => bump(&[parts[0], 0], 0),
        _ => bump(&parts[..2], 1),
    };
    format!(">={version},<{upper}")
}

pub(crate) fn render(manifest: &Manifest) -> Result<String, ManifestError> {
    let mut out = String::with_capacity(512);
    let name = manifest
        .name
        .as_deref()
        .map_or_else(|| "converted-project".to_owned(), normalize_name);

    writeln!(out, "[tool.poetry]")?;
    writeln!(out, "name = {}", toml_string(&name))?;
    writeln!(out, "version = \"0.1.0\"")?;
    writeln!(out, "description = \"\"")?;
    writeln!(out, "authors = []")?;
    writeln!(out)?;

    writeln!(out, "[tool.poetry.dependencies]")?;
    let python = manifest.python.as_deref().unwrap_or(">=3.8");
    writeln!(out, "python = {}", toml_string(python))?;
    for requirement in &manifest.packages {
        write_dependency(&mut out, requirement)?;
    }

    if !manifest.dev_packages.is_empty() {
        writeln!(out)?;
        writeln!(out, "[tool.poetry.group.dev.dependencies]")?;
        for requirement in &manifest.dev_packages {
            write_dependency(&mut out, requirement)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "[build-system]")?;
    writeln!(out, "requires = [\"poetry-core\"]")?;
    writeln!(out, "build-backend = \"poetry.core.masonry.api\"")?;

    Ok(out)
}

fn write_dependency(out: &mut String, requirement: &Requirement) -> std::fmt::Result {
    let key = toml_key(&requirement.name);
    let version = if requirement.specifier.is_empty() {
        "*"
    } else {
        requirement.specifier.as_str()
    };

    if requirement.extras.is_empty() && requirement.marker.is_none() && requirement.url.is_none()
    {
        return writeln!(out, "{key} = {}", toml_string(version));
    }

    let mut fields = Vec::new();
    match requirement.url.as_deref() {
        Some(url) => {
            if let Some(git) = url.strip_prefix("git+") {
                match git.rsplit_once('@') {
                    Some((repo, reference)) if !reference.contains('/') && repo.contains("://") => {
                        fields.push(format!("git = {}", toml_string(repo)));
                        fields.push(format!("rev = {}", toml_string(reference)));
                    }
                    _ => fields.push(format!("git = {}", toml_string(git))),
                }
            } else if url.contains("://") {
                fields.push(format!("url = {}", toml_string(url)));
            } else {
                fields.push(format!("path = {}", toml_string(url)));
                if requirement.editable {
                    fields.push("develop = true".to_owned());
                }
            }
        }
        None => fields.push(format!("version = {}", toml_string(version))),
    }
    if !requirement.extras.is_empty() {
        let extras: Vec<_> = requirement.extras.iter().map(|e| toml_string(e)).collect();
        fields.push(format!("extras = [{}]", extras.join(", ")));
    }
    if let Some(marker) = &requirement.marker {
        fields.push(format!("markers = {}", toml_string(marker)));
    }

    writeln!(out, "{key} = {{ {} }}", fields.join(", "))
}
