//! `pywise dockerize`: write a Dockerfile and `.dockerignore` for the
//! current project, and optionally build the image.

use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;

use crate::cli::DockerizeArgs;
use crate::commands::{Context, ExitStatus};
use crate::docker::{DOCKERIGNORE, DockerOptions, ProjectAnalysis, analyze_project, generate_dockerfile};
use crate::printer::Printer;
use crate::tool::Tool;

/// Execute `pywise dockerize`.
pub(super) async fn execute(
    args: &DockerizeArgs,
    ctx: &Context,
    printer: Printer,
) -> Result<ExitStatus> {
    let mut options = DockerOptions::from_settings(&ctx.settings.docker, args.python_version.clone());
    if args.multi_stage {
        options.multi_stage = true;
    }
    if args.no_optimize {
        options.optimize_layers = false;
    }
    // Fail on a bad `--python-version` before touching the environment.
    options.base_image()?;

    // The Dockerfile is still useful without package metadata.
    let packages = match ctx.installed_packages().await {
        Ok(packages) => packages,
        Err(err) => {
            printer.warn(&format!("{err:#}; generating a generic Dockerfile"));
            Vec::new()
        }
    };

    let analysis = analyze_project(&ctx.cwd, &packages);
    let dockerfile = generate_dockerfile(&analysis, &options)?;

    for (file_name, content) in [("Dockerfile", dockerfile.as_str()), (".dockerignore", DOCKERIGNORE)] {
        let path = ctx.cwd.join(file_name);
        fs_err::write(&path, content)
            .with_context(|| format!("Failed to write `{}`", path.display()))?;
        printer.success(&format!("Created {file_name}"));
    }
    print_analysis(printer, &analysis);

    if !args.build {
        return Ok(ExitStatus::Success);
    }
    // clap enforces `--tag` with `--build`.
    let Some(tag) = args.tag.as_deref() else {
        return Ok(ExitStatus::Failure);
    };

    let docker = Tool::find("docker")?;
    printer.info(&format!("Building image `{tag}`..."));
    let status = docker
        .stream(&["build", "-t", tag, "."], Some(ctx.cwd.as_path()))
        .await?;
    if !status.success() {
        printer.error(&format!("`docker build` exited with status {}", status.exit_code));
        return Ok(ExitStatus::External(status.exit_code));
    }
    printer.success(&format!("Built image `{tag}`"));

    Ok(ExitStatus::Success)
}

fn print_analysis(printer: Printer, analysis: &ProjectAnalysis) {
    let kind = if analysis.is_ml {
        "ML"
    } else if analysis.web_framework.is_some() {
        "Web"
    } else {
        "General"
    };
    printer.info(&"Docker image".bold().to_string());
    printer.info(&format!("  Project type: {kind}"));
    if let Some(framework) = &analysis.web_framework {
        printer.info(&format!("  Web framework: {} (port {})", framework.name, framework.port));
    }
    printer.info(&format!("  System dependencies: {}", analysis.system_deps.len()));
    printer.info(&format!("  Estimated size: {} MB", analysis.estimated_size_mb));
    if !analysis.installs_dependencies() {
        printer.warn("No requirements.txt or pyproject.toml found; the image installs no dependencies");
    }
}
