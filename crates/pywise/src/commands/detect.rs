//! `pywise detect`: list the packages that were installed on purpose.

use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::DetectArgs;
use crate::commands::{Context, ExitStatus};
use crate::detector::{Detector, PrimaryPackage};
use crate::environment::EnvironmentKind;
use crate::manifest::Manifest;
use crate::normalize::Requirement;
use crate::printer::Printer;

/// Dependents listed per package before the rest are summarized.
const MAX_DEPENDENTS_SHOWN: usize = 3;

#[derive(Serialize)]
struct Report<'a> {
    primary_packages: &'a [PrimaryPackage],
    total_count: usize,
    environment_type: EnvironmentKind,
}

/// Execute `pywise detect`.
pub(super) async fn execute(args: &DetectArgs, ctx: &Context, printer: Printer) -> Result<ExitStatus> {
    let packages = ctx.installed_packages().await?;
    let settings = &ctx.settings.detect;

    let detector = Detector::new(&packages)
        .with_excluded(settings.exclude_packages.as_slice())
        .with_dev_tools(args.include_dev || settings.include_dev);
    if !packages.is_empty() && !detector.graph().has_edges() {
        printer.warn("No dependency metadata available; every installed package will look primary");
    }

    let primary = detector.detect(&packages);
    let environment = EnvironmentKind::from_env(&ctx.cwd);

    if args.json {
        let report = Report {
            primary_packages: &primary,
            total_count: primary.len(),
            environment_type: environment,
        };
        printer.output(&serde_json::to_string_pretty(&report)?);
        return Ok(ExitStatus::Success);
    }

    if let Some(output) = &args.output {
        let mut manifest = Manifest::new(args.format);
        manifest.name = ctx.project_name();
        manifest.packages = primary
            .iter()
            .map(|package| Requirement::pinned(&package.name, &package.version))
            .collect();
        let content = manifest.render(args.format, false)?;
        fs_err::write(output, content)
            .with_context(|| format!("Failed to write `{}`", output.display()))?;
        printer.success(&format!(
            "Wrote {} primary package(s) to {}",
            primary.len(),
            output.display()
        ));
        return Ok(ExitStatus::Success);
    }

    if primary.is_empty() {
        printer.warn("No primary packages detected.");
        return Ok(ExitStatus::Success);
    }

    printer.info(
        &format!("Primary packages ({} found)", primary.len())
            .bold()
            .to_string(),
    );
    for line in table(&primary, args.show_dependents) {
        printer.output(&line);
    }
    printer.info(&format!("Environment: {environment}").dimmed().to_string());

    Ok(ExitStatus::Success)
}

/// Render the package table, one string per row, columns padded to width.
fn table(packages: &[PrimaryPackage], show_dependents: bool) -> Vec<String> {
    let name_width = packages
        .iter()
        .map(|package| package.name.len())
        .chain(["Package".len()])
        .max()
        .unwrap_or_default();
    let version_width = packages
        .iter()
        .map(|package| package.version.len())
        .chain(["Version".len()])
        .max()
        .unwrap_or_default();

    let mut header = format!("{:<name_width$}  {:<version_width$}  Source", "Package", "Version");
    if show_dependents {
        header.push_str("  Dependents");
    }

    let mut rows = vec![header.trim_end().bold().to_string()];
    for package in packages {
        let mut row = format!(
            "{}  {}  {:<6}",
            format!("{:<name_width$}", package.name).cyan(),
            format!("{:<version_width$}", package.version).green(),
            package.source
        );
        if show_dependents {
            row.push_str("  ");
            row.push_str(&dependents_summary(&package.dependents));
        }
        rows.push(row.trim_end().to_owned());
    }
    rows
}

/// `a, b, c (+2 more)`, or `none`.
fn dependents_summary(dependents: &[String]) -> String {
    if dependents.is_empty() {
        return "none".to_owned();
    }
    let mut summary = dependents
        .iter()
        .take(MAX_DEPENDENTS_SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if dependents.len() > MAX_DEPENDENTS_SHOWN {
        summary.push_str(&format!(" (+{} more)", dependents.len() - MAX_DEPENDENTS_SHOWN));
    }
    summary
}
