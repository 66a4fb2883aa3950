//! Pipfile writer: serialize a [`Pipfile`] to TOML.
//!
//! Sections are written in pipenv's order:
//! `[[source]]`, `[packages]`, `[dev-packages]`, `[requires]`.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use super::model::{Pipfile, PipfilePackage, PipfilePackageDetail};
use crate::manifest::{toml_key, toml_string};

impl Pipfile {
    /// Serialize the Pipfile to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, fmt::Error> {
        let mut out = String::with_capacity(512);

        for source in &self.source {
            writeln!(out, "[[source]]")?;
            writeln!(out, "url = {}", toml_string(&source.url))?;
            writeln!(out, "verify_ssl = {}", source.verify_ssl)?;
            writeln!(out, "name = {}", toml_string(&source.name))?;
            writeln!(out)?;
        }

        writeln!(out, "[packages]")?;
        write_packages(&mut out, &self.packages)?;
        writeln!(out)?;

        writeln!(out, "[dev-packages]")?;
        write_packages(&mut out, &self.dev_packages)?;

        if let Some(ref requires) = self.requires {
            writeln!(out)?;
            writeln!(out, "[requires]")?;
            if let Some(ref version) = requires.python_version {
                writeln!(out, "python_version = {}", toml_string(version))?;
            }
            if let Some(ref full_version) = requires.python_full_version {
                writeln!(out, "python_full_version = {}", toml_string(full_version))?;
            }
        }

        Ok(out)
    }
}

fn write_packages(out: &mut String, packages: &BTreeMap<String, PipfilePackage>) -> fmt::Result {
    for (name, pkg) in packages {
        match pkg {
            PipfilePackage::Simple(version) => {
                writeln!(out, "{} = {}", toml_key(name), toml_string(version))?;
            }
            PipfilePackage::Detailed(detail) => {
                writeln!(out, "{} = {{{}}}", toml_key(name), detail_fields(detail))?;
            }
        }
    }
    Ok(())
}

/// The inline table body for a detailed package spec.
fn detail_fields(detail: &PipfilePackageDetail) -> String {
    let mut fields: Vec<String> = Vec::new();

    if let Some(ref version) = detail.version {
        fields.push(format!("version = {}", toml_string(version)));
    }
    if !detail.extras.is_empty() {
        let extras: Vec<_> = detail.extras.iter().map(|e| toml_string(e)).collect();
        fields.push(format!("extras = [{}]", extras.join(", ")));
    }
    if let Some(ref git) = detail.git {
        fields.push(format!("git = {}", toml_string(git)));
    }
    if let Some(ref git_ref) = detail.git_ref {
        fields.push(format!("ref = {}", toml_string(git_ref)));
    }
    if let Some(ref path) = detail.path {
        fields.push(format!("path = {}", toml_string(path)));
    }
    if let Some(ref file) = detail.file {
        fields.push(format!("file = {}", toml_string(file)));
    }
    if detail.editable {
        fields.push("editable = true".to_owned());
    }
    if let Some(ref markers) = detail.markers {
        fields.push(format!("markers = {}", toml_string(markers)));
    }
    if let Some(ref sys_platform) = detail.sys_platform {
        fields.push(format!("sys_platform = {}", toml_string(sys_platform)));
    }

    fields.join(", ")
}
