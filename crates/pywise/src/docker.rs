//! Dockerfile and `.dockerignore` generation.
//!
//! The installed packages decide the shape of the image: web frameworks set
//! the exposed port and command, and packages with native extensions pull in
//! the apt packages they need to build or run.

use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::environment::InstalledPackage;
use crate::error::DockerError;
use crate::settings::DockerSettings;

pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// System packages needed by Python packages with native code.
const SYSTEM_DEPENDENCIES: &[(&str, &[&str])] = &[
    ("pillow", &["libjpeg-dev", "zlib1g-dev"]),
    ("psycopg2", &["libpq-dev", "gcc"]),
    ("numpy", &["gcc", "g++", "libblas-dev"]),
    ("pandas", &["gcc", "g++"]),
    ("opencv-python", &["libglib2.0-0", "libsm6"]),
    ("tensorflow", &["gcc", "g++"]),
    ("torch", &["gcc", "g++"]),
];

const ML_PACKAGES: &[&str] = &["tensorflow", "torch", "scikit-learn", "pandas", "numpy"];

/// A web framework and how to serve it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WebFramework {
    pub name: &'static str,
    pub port: u16,
    pub command: &'static [&'static str],
}

/// Checked in order; the first installed one wins.
const WEB_FRAMEWORKS: &[WebFramework] = &[
    WebFramework {
        name: "django",
        port: 8000,
        command: &["python", "manage.py", "runserver", "0.0.0.0:8000"],
    },
    WebFramework {
        name: "flask",
        port: 5000,
        command: &["python", "app.py"],
    },
    WebFramework {
        name: "fastapi",
        port: 8000,
        command: &["uvicorn", "main:app", "--host", "0.0.0.0"],
    },
    WebFramework {
        name: "streamlit",
        port: 8501,
        command: &["streamlit", "run", "app.py"],
    },
];

/// What the project looks like from the image's point of view.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalysis {
    pub package_count: usize,
    pub web_framework: Option<WebFramework>,
    pub is_ml: bool,
    /// Sorted apt package names.
    pub system_deps: Vec<&'static str>,
    pub has_requirements: bool,
    pub has_pyproject: bool,
    pub estimated_size_mb: usize,
}

impl ProjectAnalysis {
    /// Whether the image installs the project's Python dependencies.
    pub fn installs_dependencies(&self) -> bool {
        self.has_requirements || self.has_pyproject
    }
}

/// Inspect `project` and its installed `packages`.
pub fn analyze_project(project: &Path, packages: &[InstalledPackage]) -> ProjectAnalysis {
    let names: FxHashSet<String> = packages
        .iter()
        .map(InstalledPackage::normalized_name)
        .collect();

    let web_framework = WEB_FRAMEWORKS
        .iter()
        .find(|framework| names.contains(framework.name))
        .copied();
    let is_ml = ML_PACKAGES.iter().any(|&name| names.contains(name));
    let system_deps: BTreeSet<&'static str> = SYSTEM_DEPENDENCIES
        .iter()
        .filter(|(package, _)| names.contains(*package))
        .flat_map(|(_, deps)| deps.iter().copied())
        .collect();

    ProjectAnalysis {
        package_count: packages.len(),
        web_framework,
        is_ml,
        system_deps: system_deps.into_iter().collect(),
        has_requirements: project.join("requirements.txt").is_file(),
        has_pyproject: project.join("pyproject.toml").is_file(),
        estimated_size_mb: 150 + packages.len() * 5,
    }
}

/// How the Dockerfile is put together.
#[derive(Debug, Clone)]
pub struct DockerOptions {
    pub python_version: String,
    /// Overrides the `python:<version>-slim` image.
    pub base_image: Option<String>,
    /// Build dependencies in a separate stage.
    pub multi_stage: bool,
    /// Set Python's container-friendly environment and merge `RUN` layers.
    pub optimize_layers: bool,
}

impl DockerOptions {
    pub fn from_settings(settings: &DockerSettings, python_version: Option<String>) -> Self {
        Self {
            python_version: python_version.unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_owned()),
            base_image: settings.base_image.clone(),
            multi_stage: settings.multi_stage,
            optimize_layers: settings.optimize_layers,
        }
    }

    /// The image to build `FROM`.
    pub fn base_image(&self) -> Result<String, DockerError> {
        if let Some(image) = &self.base_image {
            return Ok(image.clone());
        }
        let version = self.python_version.trim();
        let is_major_minor = version.split('.').count() == 2
            && version
                .split('.')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
        if !is_major_minor {
            return Err(DockerError::InvalidPythonVersion(self.python_version.clone()));
        }
        Ok(format!("python:{version}-slim"))
    }
}

/// `gcc`, `g++` and `-dev` headers are only needed to compile wheels.
fn is_build_only(package: &str) -> bool {
    matches!(package, "gcc" | "g++") || package.ends_with("-dev")
}

/// Render the Dockerfile.
pub fn generate_dockerfile(
    analysis: &ProjectAnalysis,
    options: &DockerOptions,
) -> Result<String, DockerError> {
    let base_image = options.base_image()?;
    let mut out = String::with_capacity(1024);
    if options.multi_stage && analysis.installs_dependencies() {
        write_multi_stage(&mut out, analysis, options, &base_image)?;
    } else {
        write_single_stage(&mut out, analysis, options, &base_image)?;
    }
    Ok(out)
}

fn write_single_stage(
    out: &mut String,
    analysis: &ProjectAnalysis,
    options: &DockerOptions,
    base_image: &str,
) -> fmt::Result {
    writeln!(out, "FROM {base_image}")?;
    write_env(out, options)?;
    writeln!(out)?;
    writeln!(out, "# Set working directory")?;
    writeln!(out, "WORKDIR /app")?;
    write_apt_install(out, &analysis.system_deps)?;

    if analysis.has_requirements {
        writeln!(out)?;
        writeln!(out, "# Copy and install Python dependencies")?;
        writeln!(out, "COPY requirements.txt .")?;
        writeln!(out, "RUN pip install --no-cache-dir -r requirements.txt")?;
    }

    writeln!(out)?;
    writeln!(out, "# Copy application code")?;
    writeln!(out, "COPY . .")?;
    if !analysis.has_requirements && analysis.has_pyproject {
        writeln!(out, "RUN pip install --no-cache-dir .")?;
    }

    write_user_and_command(out, analysis, options)
}

fn write_multi_stage(
    out: &mut String,
    analysis: &ProjectAnalysis,
    options: &DockerOptions,
    base_image: &str,
) -> fmt::Result {
    writeln!(out, "FROM {base_image} AS builder")?;
    writeln!(out)?;
    writeln!(out, "WORKDIR /app")?;
    write_apt_install(out, &analysis.system_deps)?;

    writeln!(out)?;
    writeln!(out, "# Install Python dependencies into /install")?;
    if analysis.has_requirements {
        writeln!(out, "COPY requirements.txt .")?;
        writeln!(
            out,
            "RUN pip install --no-cache-dir --prefix=/install -r requirements.txt"
        )?;
    } else {
        writeln!(out, "COPY . .")?;
        writeln!(out, "RUN pip install --no-cache-dir --prefix=/install .")?;
    }

    writeln!(out)?;
    writeln!(out, "FROM {base_image}")?;
    write_env(out, options)?;
    writeln!(out)?;
    writeln!(out, "WORKDIR /app")?;
    let runtime_deps: Vec<&str> = analysis
        .system_deps
        .iter()
        .copied()
        .filter(|dep| !is_build_only(dep))
        .collect();
    write_apt_install(out, &runtime_deps)?;

    writeln!(out)?;
    writeln!(out, "# Copy installed packages from the builder")?;
    writeln!(out, "COPY --from=builder /install /usr/local")?;
    writeln!(out)?;
    writeln!(out, "# Copy application code")?;
    writeln!(out, "COPY . .")?;

    write_user_and_command(out, analysis, options)
}

fn write_env(out: &mut String, options: &DockerOptions) -> fmt::Result {
    if options.optimize_layers {
        writeln!(out)?;
        writeln!(out, "ENV PYTHONDONTWRITEBYTECODE=1 \\")?;
        writeln!(out, "    PYTHONUNBUFFERED=1")?;
    }
    Ok(())
}

fn write_apt_install(out: &mut String, packages: &[&str]) -> fmt::Result {
    if packages.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "# Install system dependencies")?;
    writeln!(
        out,
        "RUN apt-get update && apt-get install -y --no-install-recommends \\"
    )?;
    writeln!(out, "    {} \\", packages.join(" "))?;
    writeln!(out, "    && rm -rf /var/lib/apt/lists/*")
}

fn write_user_and_command(
    out: &mut String,
    analysis: &ProjectAnalysis,
    options: &DockerOptions,
) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "# Create non-root user")?;
    if options.optimize_layers {
        writeln!(
            out,
            "RUN groupadd -r appuser && useradd -r -g appuser appuser && chown -R appuser:appuser /app"
        )?;
    } else {
        writeln!(out, "RUN groupadd -r appuser && useradd -r -g appuser appuser")?;
        writeln!(out, "RUN chown -R appuser:appuser /app")?;
    }
    writeln!(out, "USER appuser")?;

    writeln!(out)?;
    match analysis.web_framework {
        Some(framework) => {
            writeln!(out, "EXPOSE {}", framework.port)?;
            writeln!(out, "CMD {}", exec_form(framework.command))
        }
        None => writeln!(out, "CMD {}", exec_form(&["python", "main.py"])),
    }
}

/// `["uvicorn", "main:app"]`, Docker's JSON exec form.
fn exec_form(command: &[&str]) -> String {
    let args: Vec<String> = command.iter().map(|arg| format!("\"{arg}\"")).collect();
    format!("[{}]", args.join(", "))
}

/// The `.dockerignore` written next to the Dockerfile.
pub const DOCKERIGNORE: &str = "\
__pycache__/
*.py[cod]
*.egg-info/
.pytest_cache/
.mypy_cache/
.ruff_cache/
.git/
.gitignore
.vscode/
.idea/
.venv/
venv/
env/
tests/
docs/
Dockerfile
.dockerignore
";
