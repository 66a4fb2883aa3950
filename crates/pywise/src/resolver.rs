//! Hybrid conda/pip source selection.
//!
//! Compiled scientific packages tend to install better from conda-forge,
//! while the rest of the ecosystem is best left to pip. [`HybridResolver`]
//! places each requested package on one side using built-in tables that
//! `.pywise.yml` can extend, then assembles either a conda environment with a
//! pip subsection or a plain pip requirement list.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ManifestError;
use crate::manifest::CondaEnvironment;
use crate::manifest::conda::DEFAULT_CHANNELS;
use crate::normalize::{Requirement, normalize_name};
use crate::settings::ResolveSettings;

/// Packages that are better installed from conda.
const PREFER_CONDA: &[&str] = &[
    "numpy",
    "scipy",
    "pandas",
    "matplotlib",
    "scikit-learn",
    "tensorflow",
    "pytorch",
    "opencv",
    "pillow",
    "numba",
    "jupyterlab",
    "jupyter",
    "ipython",
    "spyder",
];

/// Packages that should stay with pip.
const PREFER_PIP: &[&str] = &[
    "flask",
    "django",
    "fastapi",
    "requests",
    "click",
    "rich",
    "pydantic",
    "sqlalchemy",
    "alembic",
    "celery",
];

/// PyPI names whose conda package is named differently.
const CONDA_NAMES: &[(&str, &str)] = &[
    ("opencv-python", "opencv"),
    ("msgpack", "msgpack-python"),
    ("pyqt5", "pyqt"),
    ("torch", "pytorch"),
];

pub const DEFAULT_ENV_NAME: &str = "hybrid-env";

const CONDA_REASON: &str = "Better performance/compatibility";
const PIP_REASON: &str = "Pip ecosystem package";
const DEFAULT_REASON: &str = "Default to pip";
const SYNTAX_REASON: &str = "Uses requirement syntax conda cannot express";

/// How `resolve` splits packages between conda and pip.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Conda for scientific packages, pip for the rest.
    #[default]
    Hybrid,
    /// Everything from conda.
    CondaOnly,
    /// Everything from pip.
    PipOnly,
}

/// Where one requested package should come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// The requirement as given.
    pub original: String,
    /// Its normalized name.
    pub name: String,
    /// The conda package name, for conda placements.
    pub conda_name: Option<String>,
    pub reason: &'static str,
}

/// Every requested package placed on exactly one side, in input order.
#[derive(Debug, Clone, Default)]
pub struct SourceAnalysis {
    pub conda: Vec<Placement>,
    pub pip: Vec<Placement>,
    pub recommendations: Vec<String>,
}

/// The environment `resolve` settled on.
#[derive(Debug, Clone)]
pub enum Resolution {
    CondaHybrid {
        environment: CondaEnvironment,
        conda_packages: usize,
        pip_packages: usize,
        recommendations: Vec<String>,
    },
    Pip {
        packages: Vec<String>,
        recommendations: Vec<String>,
    },
}

impl Resolution {
    pub fn recommendations(&self) -> &[String] {
        match self {
            Self::CondaHybrid {
                recommendations, ..
            }
            | Self::Pip {
                recommendations, ..
            } => recommendations,
        }
    }

    /// The file this resolution is written to by default.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::CondaHybrid { .. } => "environment.yml",
            Self::Pip { .. } => "requirements.txt",
        }
    }

    /// Render as `environment.yml` or `requirements.txt` content.
    pub fn render(&self) -> Result<String, ManifestError> {
        match self {
            Self::CondaHybrid { environment, .. } => environment.to_yaml(),
            Self::Pip { packages, .. } => {
                let mut out = String::from("# Generated by pywise\n\n");
                for package in packages {
                    out.push_str(package);
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

/// Places packages on conda or pip.
#[derive(Debug, Clone)]
pub struct HybridResolver {
    prefer_conda: FxHashSet<String>,
    prefer_pip: FxHashSet<String>,
    conda_names: FxHashMap<String, String>,
    conda_available: bool,
}

impl HybridResolver {
    pub fn new(conda_available: bool) -> Self {
        let owned = |names: &[&str]| -> FxHashSet<String> {
            names.iter().map(|&name| name.to_owned()).collect()
        };
        Self {
            prefer_conda: owned(PREFER_CONDA),
            prefer_pip: owned(PREFER_PIP),
            conda_names: CONDA_NAMES
                .iter()
                .map(|&(pip, conda)| (pip.to_owned(), conda.to_owned()))
                .collect(),
            conda_available,
        }
    }

    /// Extend the built-in tables with configured preferences. A configured
    /// package is removed from the opposite table.
    #[must_use]
    pub fn with_settings(mut self, settings: &ResolveSettings) -> Self {
        for name in &settings.prefer_conda {
            let name = normalize_name(name);
            self.prefer_pip.remove(&name);
            self.prefer_conda.insert(name);
        }
        for name in &settings.prefer_pip {
            let name = normalize_name(name);
            self.prefer_conda.remove(&name);
            self.prefer_pip.insert(name);
        }
        self
    }

    pub fn conda_available(&self) -> bool {
        self.conda_available
    }

    /// The conda package name for a PyPI distribution.
    pub fn conda_name(&self, name: &str) -> String {
        let name = normalize_name(name);
        self.conda_names.get(&name).cloned().unwrap_or(name)
    }

    fn prefers_conda(&self, name: &str) -> bool {
        !self.prefer_pip.contains(name)
            && (self.prefer_conda.contains(name)
                || self.prefer_conda.contains(&self.conda_name(name)))
    }

    /// Decide where each spec should come from.
    pub fn analyze<S: AsRef<str>>(&self, specs: &[S]) -> Result<SourceAnalysis, ManifestError> {
        let mut analysis = SourceAnalysis::default();

        for spec in specs {
            let spec = spec.as_ref().trim();
            let requirement = Requirement::parse(spec)?;
            let name = requirement.normalized_name();

            let placement = |reason, conda_name| Placement {
                original: spec.to_owned(),
                name: name.clone(),
                conda_name,
                reason,
            };

            if self.prefers_conda(&name) {
                if requirement.is_conda_expressible() {
                    analysis
                        .conda
                        .push(placement(CONDA_REASON, Some(self.conda_name(&name))));
                } else {
                    analysis.pip.push(placement(SYNTAX_REASON, None));
                }
            } else if self.prefer_pip.contains(&name) {
                analysis.pip.push(placement(PIP_REASON, None));
            } else {
                analysis.pip.push(placement(DEFAULT_REASON, None));
            }
        }

        if !analysis.conda.is_empty() && !self.conda_available {
            analysis.recommendations.push(
                "Install conda/miniconda for better scientific package management".to_owned(),
            );
        }
        if analysis.conda.len() > analysis.pip.len() * 2 {
            analysis.recommendations.push(
                "Consider using conda as primary package manager for this project".to_owned(),
            );
        }

        debug!(
            "{} package(s) placed on conda, {} on pip",
            analysis.conda.len(),
            analysis.pip.len()
        );
        Ok(analysis)
    }

    /// Resolve `specs` into an environment using `strategy`.
    pub fn resolve<S: AsRef<str>>(
        &self,
        specs: &[S],
        strategy: Strategy,
        env_name: &str,
    ) -> Result<Resolution, ManifestError> {
        let analysis = self.analyze(specs)?;

        match strategy {
            Strategy::Hybrid if self.conda_available => self.conda_hybrid(analysis, env_name),
            Strategy::Hybrid | Strategy::PipOnly => Ok(pip_solution(analysis, specs)),
            Strategy::CondaOnly => self.conda_only(analysis, specs, env_name),
        }
    }

    fn conda_hybrid(
        &self,
        analysis: SourceAnalysis,
        env_name: &str,
    ) -> Result<Resolution, ManifestError> {
        let mut conda = Vec::with_capacity(analysis.conda.len());
        for placement in &analysis.conda {
            let requirement = Requirement::parse(&placement.original)?;
            let conda_name = placement
                .conda_name
                .clone()
                .unwrap_or_else(|| self.conda_name(&placement.name));
            conda.push(requirement.to_conda_spec(&conda_name));
        }
        let pip: Vec<String> = analysis
            .pip
            .iter()
            .map(|placement| placement.original.clone())
            .collect();

        let conda_packages = conda.len();
        let pip_packages = pip.len();
        Ok(Resolution::CondaHybrid {
            environment: CondaEnvironment::new(env_name, default_channels(), conda, pip),
            conda_packages,
            pip_packages,
            recommendations: analysis.recommendations,
        })
    }

    fn conda_only<S: AsRef<str>>(
        &self,
        mut analysis: SourceAnalysis,
        specs: &[S],
        env_name: &str,
    ) -> Result<Resolution, ManifestError> {
        let mut conda = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = spec.as_ref().trim();
            let requirement = Requirement::parse(spec)?;
            let conda_name = self.conda_name(&requirement.name);
            if requirement.is_conda_expressible() {
                conda.push(requirement.to_conda_spec(&conda_name));
            } else {
                analysis
                    .recommendations
                    .push(format!("Dropped pip-only requirement syntax from `{spec}`"));
                conda.push(conda_name);
            }
        }

        let conda_packages = conda.len();
        Ok(Resolution::CondaHybrid {
            environment: CondaEnvironment::new(env_name, default_channels(), conda, Vec::new()),
            conda_packages,
            pip_packages: 0,
            recommendations: analysis.recommendations,
        })
    }
}

fn pip_solution<S: AsRef<str>>(analysis: SourceAnalysis, specs: &[S]) -> Resolution {
    let mut recommendations = analysis.recommendations;
    if !analysis.conda.is_empty() {
        recommendations.push("Some packages might perform better with conda installation".to_owned());
    }
    Resolution::Pip {
        packages: specs
            .iter()
            .map(|spec| spec.as_ref().trim().to_owned())
            .collect(),
        recommendations,
    }
}

fn default_channels() -> Vec<String> {
    DEFAULT_CHANNELS
        .iter()
        .map(|&channel| channel.to_owned())
        .collect()
}
