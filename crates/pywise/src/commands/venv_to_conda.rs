//! `pywise venv-to-conda`: recreate the current virtualenv as a conda
//! environment.
//!
//! Scientific packages move to conda unpinned so conda can pick builds that
//! fit together; everything else stays on pip at its installed version.

use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;

use crate::cli::VenvToCondaArgs;
use crate::commands::{Context, ExitStatus};
use crate::environment::{EnvironmentKind, InstalledPackage};
use crate::manifest::CondaEnvironment;
use crate::manifest::conda::DEFAULT_CHANNELS;
use crate::normalize::normalize_name;
use crate::printer::Printer;
use crate::tool::Tool;

const ENVIRONMENT_FILE: &str = "environment.yml";
const REQUIREMENTS_FILE: &str = "requirements.txt";
const REQUIREMENTS_BACKUP: &str = "requirements.txt.backup";

/// Installed from conda instead of pip.
const CONDA_PREFERRED: &[&str] = &[
    "numpy",
    "scipy",
    "pandas",
    "matplotlib",
    "scikit-learn",
    "tensorflow",
    "pytorch",
    "jupyterlab",
    "jupyter",
];

const SKIPPED: &[&str] = &["pip", "setuptools", "wheel"];

/// The environment to create, before it is written.
#[derive(Debug)]
struct Conversion {
    environment: CondaEnvironment,
    conda_packages: usize,
    pip_packages: usize,
}

/// Execute `pywise venv-to-conda`.
pub(super) async fn execute(
    args: &VenvToCondaArgs,
    ctx: &Context,
    printer: Printer,
) -> Result<ExitStatus> {
    let kind = EnvironmentKind::from_env(&ctx.cwd);
    if !matches!(kind, EnvironmentKind::Venv | EnvironmentKind::System) {
        printer.error(&format!(
            "`venv-to-conda` converts a virtualenv or the system Python, but the current environment is {kind}"
        ));
        return Ok(ExitStatus::Failure);
    }

    let conda = if args.no_create {
        None
    } else {
        match Tool::find("conda") {
            Ok(conda) => Some(conda),
            Err(err) => {
                printer.error(&err.to_string());
                printer.info("Install conda/miniconda, or pass `--no-create` to only write environment.yml");
                return Ok(ExitStatus::Failure);
            }
        }
    };

    let name = match &args.name {
        Some(name) => name.clone(),
        None => default_env_name(ctx.project_name().as_deref().unwrap_or("pywise-env")),
    };
    let packages = ctx.installed_packages().await?;
    let conversion = convert(&name, args.python_version.as_deref(), &packages);

    let environment_file = ctx.cwd.join(ENVIRONMENT_FILE);
    if environment_file.exists() {
        printer.warn(&format!("Overwriting {ENVIRONMENT_FILE}"));
    }
    fs_err::write(&environment_file, conversion.environment.to_yaml()?)
        .with_context(|| format!("Failed to write `{}`", environment_file.display()))?;
    printer.success(&format!("Wrote {ENVIRONMENT_FILE}"));

    let Some(conda) = conda else {
        printer.info(&format!("Create it with: conda env create -f {ENVIRONMENT_FILE}"));
        return Ok(ExitStatus::Success);
    };

    printer.info(&format!("Creating conda environment `{name}`..."));
    let status = conda
        .stream(&["env", "create", "-f", ENVIRONMENT_FILE], Some(ctx.cwd.as_path()))
        .await?;
    if !status.success() {
        printer.error(&format!("`conda env create` exited with status {}", status.exit_code));
        return Ok(ExitStatus::External(status.exit_code));
    }

    let requirements = ctx.cwd.join(REQUIREMENTS_FILE);
    let backed_up = if requirements.is_file() {
        fs_err::rename(&requirements, ctx.cwd.join(REQUIREMENTS_BACKUP))?;
        true
    } else {
        false
    };

    printer.success(&format!("Created conda environment `{name}`"));
    printer.info(&format!("  Conda packages: {}", conversion.conda_packages));
    printer.info(&format!("  Pip packages: {}", conversion.pip_packages));
    printer.info(&format!("  Files created: {ENVIRONMENT_FILE}"));
    if backed_up {
        printer.info(&format!("  Backed up: {REQUIREMENTS_FILE} -> {REQUIREMENTS_BACKUP}"));
    }

    printer.info(&"Next steps:".bold().to_string());
    let last_step = if args.keep_venv {
        "Old virtualenv preserved"
    } else {
        "Delete the old virtualenv once everything works"
    };
    let steps = [
        format!("Run: conda activate {name}"),
        "Test your application in the new environment".to_owned(),
        last_step.to_owned(),
    ];
    for (index, step) in steps.iter().enumerate() {
        printer.info(&format!("  {}. {step}", index + 1));
    }
    printer.output(&format!("conda activate {name}"));

    Ok(ExitStatus::Success)
}

/// `My Project_v2` -> `my-project-v2`.
fn default_env_name(dir_name: &str) -> String {
    dir_name.replace([' ', '_'], "-").to_lowercase()
}

fn convert(name: &str, python_version: Option<&str>, packages: &[InstalledPackage]) -> Conversion {
    let python = match python_version {
        Some(version) => format!("python={version}"),
        None => "python>=3.8".to_owned(),
    };

    let mut conda = vec![python];
    let mut pip = Vec::new();
    for package in packages {
        let normalized = normalize_name(&package.name);
        if SKIPPED.contains(&normalized.as_str()) {
            continue;
        }
        if CONDA_PREFERRED.contains(&normalized.as_str()) {
            conda.push(normalized);
        } else {
            pip.push(format!("{}=={}", package.name, package.version));
        }
    }

    let conda_packages = conda.len() - 1;
    let pip_packages = pip.len();
    let channels = DEFAULT_CHANNELS.iter().map(|&channel| channel.to_owned()).collect();
    Conversion {
        environment: CondaEnvironment::new(name, channels, conda, pip),
        conda_packages,
        pip_packages,
    }
}
