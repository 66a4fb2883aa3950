//! Primary-package detection.
//!
//! A *primary* package is one the user asked for, as opposed to one pip
//! pulled in to satisfy another package. Installed metadata doesn't record
//! that reliably, so we classify with a heuristic over the reverse
//! dependency graph:
//!
//! 1. well-known support libraries (`certifi`, `six`, ...) and excluded
//!    packages are never primary, nor are dev tools unless requested;
//! 2. a package nothing depends on is primary;
//! 3. otherwise, a package with at most two dependents is still primary,
//!    even when its only dependent is a support library.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::trace;

use crate::environment::InstalledPackage;
use crate::normalize::normalize_name;

/// Packages that are almost always installed as somebody else's dependency.
const COMMON_DEPENDENCIES: &[&str] = &[
    "pip",
    "setuptools",
    "wheel",
    "distlib",
    "packaging",
    "six",
    "certifi",
    "charset-normalizer",
    "idna",
    "urllib3",
    "requests-oauthlib",
    "pyasn1",
    "pyasn1-modules",
    "rsa",
    "cachetools",
    "google-auth",
    "pyparsing",
    "cycler",
    "kiwisolver",
    "python-dateutil",
    "pytz",
    "markupsafe",
    "itsdangerous",
    "blinker",
    "importlib-metadata",
    "zipp",
    "typing-extensions",
    "colorama",
];

/// Development tools, reported only when dev packages are included.
pub const DEV_TOOLS: &[&str] = &[
    "pytest",
    "pytest-cov",
    "black",
    "flake8",
    "mypy",
    "ruff",
    "isort",
    "pylint",
    "coverage",
    "tox",
    "pre-commit",
];

/// Reverse-dependency lookups over the installed packages.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Normalized name -> normalized names it depends on.
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn build(packages: &[InstalledPackage]) -> Self {
        let edges = packages
            .iter()
            .map(|package| {
                (
                    package.normalized_name(),
                    package.requires.iter().cloned().collect(),
                )
            })
            .collect();
        Self { edges }
    }

    /// Installed packages that declare a dependency on `name`.
    pub fn dependents(&self, name: &str) -> BTreeSet<String> {
        let name = normalize_name(name);
        self.edges
            .iter()
            .filter(|(_, dependencies)| dependencies.contains(&name))
            .map(|(package, _)| package.clone())
            .collect()
    }

    /// Whether the graph has any dependency edges at all.
    ///
    /// `pip list` does not report dependencies; in that case every package
    /// looks like a leaf.
    pub fn has_edges(&self) -> bool {
        self.edges.values().any(|dependencies| !dependencies.is_empty())
    }
}

/// A package classified as primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryPackage {
    pub name: String,
    pub version: String,
    /// Where the package was installed from.
    pub source: &'static str,
    pub editable: bool,
    /// Installed packages that depend on this one, sorted.
    pub dependents: Vec<String>,
}

/// Classifies installed packages as primary or transitive.
#[derive(Debug)]
pub struct Detector {
    graph: DependencyGraph,
    common: FxHashSet<String>,
    excluded: FxHashSet<String>,
    dev_tools: FxHashSet<String>,
    include_dev: bool,
}

impl Detector {
    pub fn new(packages: &[InstalledPackage]) -> Self {
        Self {
            graph: DependencyGraph::build(packages),
            common: COMMON_DEPENDENCIES.iter().map(|&name| name.to_owned()).collect(),
            excluded: FxHashSet::default(),
            dev_tools: DEV_TOOLS.iter().map(|&name| name.to_owned()).collect(),
            include_dev: false,
        }
    }

    /// Never report these packages as primary.
    #[must_use]
    pub fn with_excluded<S: AsRef<str>>(mut self, excluded: &[S]) -> Self {
        self.excluded
            .extend(excluded.iter().map(|name| normalize_name(name.as_ref())));
        self
    }

    /// Report development tools as primary packages.
    #[must_use]
    pub fn with_dev_tools(mut self, include_dev: bool) -> Self {
        self.include_dev = include_dev;
        self
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Decide whether `name` is a primary package.
    pub fn is_primary(&self, name: &str) -> bool {
        let name = normalize_name(name);

        if self.common.contains(&name) || self.excluded.contains(&name) {
            return false;
        }
        if !self.include_dev && self.dev_tools.contains(&name) {
            return false;
        }

        let dependents = self.graph.dependents(&name);
        trace!("{name} has {} dependent(s)", dependents.len());

        // Leaves and packages shared by one or two others are primary.
        dependents.len() <= 2
    }

    /// The primary packages among `packages`, in input order.
    pub fn detect(&self, packages: &[InstalledPackage]) -> Vec<PrimaryPackage> {
        packages
            .iter()
            .filter(|package| self.is_primary(&package.name))
            .map(|package| PrimaryPackage {
                name: package.name.clone(),
                version: package.version.clone(),
                source: "pip",
                editable: package.editable,
                dependents: self.graph.dependents(&package.name).into_iter().collect(),
            })
            .collect()
    }
}
