//! Package name normalization and requirement-string parsing.
//!
//! Names are compared in their PEP 503 normalized form everywhere in pywise:
//! runs of `-`, `_` and `.` collapse to a single `-` and the result is
//! lowercased. [`Requirement`] is the format-neutral dependency entry shared
//! by the manifest readers and writers.

use std::fmt;
use std::str::FromStr;

use uv_normalize::PackageName;
use uv_pep508::{VerbatimUrl, VersionOrUrl};

use crate::error::ManifestError;

/// Normalize a distribution name per PEP 503.
///
/// Strings that are not valid distribution names are only lowercased.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim();
    PackageName::from_str(name).map_or_else(|_| name.to_lowercase(), |name| name.to_string())
}

/// Return the distribution-name portion of a requirement string.
///
/// Examples: `"requests>=2.0"` -> `"requests"`,
///           `"flask[async] ; python_version > '3.8'"` -> `"flask"`.
pub fn requirement_name(spec: &str) -> &str {
    let spec = spec.trim();
    let end = spec
        .find(|c: char| {
            c.is_whitespace() || matches!(c, '[' | '(' | ';' | '@' | '<' | '>' | '=' | '!' | '~')
        })
        .unwrap_or(spec.len());
    &spec[..end]
}

/// A single dependency as written in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Distribution name, as written.
    pub name: String,
    /// Requested extras (`requests[security]`).
    pub extras: Vec<String>,
    /// PEP 440 version specifier; empty means any version.
    pub specifier: String,
    /// PEP 508 environment marker, without the leading `;`.
    pub marker: Option<String>,
    /// Direct reference (`name @ https://...`), VCS URL or local path.
    pub url: Option<String>,
    /// Installed in development mode (`pip install -e`).
    pub editable: bool,
}

impl Requirement {
    /// A requirement on `name` with no version constraint.
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            specifier: String::new(),
            marker: None,
            url: None,
            editable: false,
        }
    }

    /// A requirement pinned to exactly `version`.
    pub fn pinned(name: impl Into<String>, version: &str) -> Self {
        Self {
            specifier: format!("=={version}"),
            ..Self::any(name)
        }
    }

    /// Parse a PEP 508 requirement: `name[extra,...] specifier ; marker` or
    /// `name @ url ; marker`.
    ///
    /// The name and marker are kept as written; the specifier is rendered
    /// without whitespace.
    pub fn parse(spec: &str) -> Result<Self, ManifestError> {
        let spec = spec.trim();
        let parsed = uv_pep508::Requirement::<VerbatimUrl>::from_str(spec).map_err(|err| {
            ManifestError::InvalidRequirement {
                spec: spec.to_owned(),
                reason: err.to_string(),
            }
        })?;

        let specifier = match &parsed.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => specifiers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Some(VersionOrUrl::Url(_)) | None => String::new(),
        };
        let is_url = matches!(parsed.version_or_url, Some(VersionOrUrl::Url(_)));

        // A URL may contain `;`, so its marker has to follow whitespace.
        let marker_separator = if is_url { " ;" } else { ";" };
        let (body, marker) = match spec.rsplit_once(marker_separator) {
            Some((body, marker)) => (body.trim(), Some(marker.trim())),
            None => (spec, None),
        };
        let url = body
            .split_once('@')
            .filter(|_| is_url)
            .map(|(_, url)| url.trim().to_owned());

        Ok(Self {
            name: requirement_name(body).to_owned(),
            extras: parsed.extras.iter().map(ToString::to_string).collect(),
            specifier,
            marker: marker.filter(|marker| !marker.is_empty()).map(str::to_owned),
            url,
            editable: false,
        })
    }

    /// Parse a conda match spec such as `numpy`, `numpy=1.21`,
    /// `numpy>=1.20` or `conda-forge::numpy=1.21=py39_0`.
    pub fn from_conda(spec: &str) -> Result<Self, ManifestError> {
        // Drop a channel prefix.
        let spec = spec.rsplit_once("::").map_or(spec, |(_, rest)| rest).trim();
        let name = requirement_name(spec);
        if name.is_empty() {
            return Err(ManifestError::InvalidRequirement {
                spec: spec.to_owned(),
                reason: "missing package name".to_owned(),
            });
        }
        let rest = spec[name.len()..].trim();

        // `numpy 1.21 py39_0` is the space-separated form of `numpy=1.21=py39_0`.
        let fuzzy = match rest.strip_prefix('=') {
            Some(version) if !version.starts_with('=') => Some(version),
            Some(_) => None,
            None if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                rest.split_whitespace().next()
            }
            None => None,
        };
        let specifier = if let Some(fuzzy) = fuzzy {
            // A fuzzy match, optionally followed by `=<build>`.
            let version = fuzzy.split('=').next().unwrap_or_default();
            let version = version.trim_end_matches(".*").trim_end_matches('*');
            if version.is_empty() {
                String::new()
            } else {
                format!("=={version}.*")
            }
        } else {
            rest.split_whitespace().collect()
        };

        Ok(Self {
            specifier,
            ..Self::any(name)
        })
    }

    /// The PEP 503 normalized name.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether conda's match-spec syntax can express this requirement.
    pub fn is_conda_expressible(&self) -> bool {
        self.extras.is_empty()
            && self.marker.is_none()
            && self.url.is_none()
            && !self.specifier.contains("~=")
            && !self.specifier.contains("!=")
            && !self.specifier.contains("===")
    }

    /// Render as a conda match spec, renaming the package to `conda_name`.
    ///
    /// `==1.21.*` is written back as conda's fuzzy `=1.21`.
    pub fn to_conda_spec(&self, conda_name: &str) -> String {
        match self
            .specifier
            .strip_prefix("==")
            .and_then(|version| version.strip_suffix(".*"))
        {
            Some(version) if !self.specifier.contains(',') => format!("{conda_name}={version}"),
            _ => format!("{conda_name}{}", self.specifier),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {url}")?;
        } else {
            f.write_str(&self.specifier)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}
