//! `requirements.txt` reading and writing.

use std::fmt::Write;

use tracing::debug;

use crate::error::ManifestError;
use crate::manifest::{Format, Manifest};
use crate::normalize::Requirement;

/// Parse a requirements file.
///
/// Blank lines and comments are skipped, as are pip options (`-r`, `-e`,
/// `--index-url`, ...), which have no equivalent in the other formats.
pub(crate) fn parse(content: &str) -> Result<Manifest, ManifestError> {
    let mut manifest = Manifest::new(Format::Pip);

    for line in logical_lines(content) {
        let line = strip_comment(&line);
        if line.is_empty() {
            continue;
        }
        if line.starts_with('-') {
            debug!("Skipping pip option: {line}");
            continue;
        }
        manifest.packages.push(parse_line(line)?);
    }

    Ok(manifest)
}

/// Parse one requirement line.
///
/// Besides PEP 508 requirements, pip accepts a bare URL that names its
/// package in an `#egg=` fragment (`git+https://host/repo.git#egg=name`).
pub(crate) fn parse_line(line: &str) -> Result<Requirement, ManifestError> {
    let target = line.split_whitespace().next().unwrap_or_default();
    if !target.contains("://") {
        return Requirement::parse(line);
    }

    let name = target
        .split_once('#')
        .and_then(|(_, fragment)| {
            fragment
                .split('&')
                .find_map(|part| part.strip_prefix("egg="))
        })
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ManifestError::InvalidRequirement {
            spec: line.to_owned(),
            reason: "a URL requirement needs an `#egg=<name>` fragment".to_owned(),
        })?;

    Requirement::parse(&format!("{name} @ {line}")).map_err(|err| match err {
        ManifestError::InvalidRequirement { reason, .. } => ManifestError::InvalidRequirement {
            spec: line.to_owned(),
            reason,
        },
        err => err,
    })
}

/// Join backslash continuations into single lines.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for line in content.lines() {
        if let Some(continued) = line.strip_suffix('\\') {
            current.push_str(continued);
            current.push(' ');
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A `#` starts a comment at the beginning of a line or after whitespace.
fn strip_comment(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(index) => line[..index].trim_end(),
        None => line,
    }
}

pub(crate) fn render(manifest: &Manifest, include_dev: bool) -> Result<String, ManifestError> {
    let mut out = String::new();
    writeln!(out, "# Generated by pywise")?;
    if let Some(python) = &manifest.python {
        writeln!(out, "# Requires Python {python}")?;
    }
    writeln!(out)?;

    for requirement in &manifest.packages {
        writeln!(out, "{}", line(requirement))?;
    }

    if include_dev && !manifest.dev_packages.is_empty() {
        writeln!(out)?;
        writeln!(out, "# Development dependencies")?;
        for requirement in &manifest.dev_packages {
            writeln!(out, "{}", line(requirement))?;
        }
    }

    Ok(out)
}

/// Local paths and editable installs use pip's command-line syntax.
fn line(requirement: &Requirement) -> String {
    match requirement.url.as_deref() {
        Some(url) if requirement.editable => format!("-e {url}"),
        Some(url) if !url.contains("://") => url.to_owned(),
        _ => requirement.to_string(),
    }
}
