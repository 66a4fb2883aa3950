//! `pywise resolve`: split requirements between conda and pip.

use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;

use crate::cli::ResolveArgs;
use crate::commands::{Context, ExitStatus};
use crate::printer::Printer;
use crate::resolver::{HybridResolver, Placement, Resolution};
use crate::tool::Tool;

/// Execute `pywise resolve`.
pub(super) async fn execute(args: &ResolveArgs, ctx: &Context, printer: Printer) -> Result<ExitStatus> {
    let strategy = args
        .strategy
        .or(ctx.settings.resolve.strategy)
        .unwrap_or_default();
    let conda_available = Tool::is_available("conda").await;

    let resolver = HybridResolver::new(conda_available).with_settings(&ctx.settings.resolve);
    let analysis = resolver.analyze(args.packages.as_slice())?;

    print_placements(printer, "Recommended for conda", &analysis.conda);
    print_placements(printer, "Recommended for pip", &analysis.pip);

    let resolution = resolver.resolve(args.packages.as_slice(), strategy, &args.name)?;

    if !resolution.recommendations().is_empty() {
        printer.info(&"Recommendations:".bold().to_string());
        for recommendation in resolution.recommendations() {
            printer.info(&format!("  • {recommendation}"));
        }
    }

    match &resolution {
        Resolution::CondaHybrid {
            environment,
            conda_packages,
            pip_packages,
            ..
        } => {
            printer.success(&format!(
                "Conda environment `{}` ready ({conda_packages} conda, {pip_packages} pip)",
                environment.name.as_deref().unwrap_or(&args.name)
            ));
        }
        Resolution::Pip { packages, .. } => {
            printer.success(&format!("Pip requirements ready ({} packages)", packages.len()));
        }
    }

    let content = resolution.render()?;
    match &args.output {
        Some(output) => {
            fs_err::write(output, content)
                .with_context(|| format!("Failed to write `{}`", output.display()))?;
            printer.success(&format!("Wrote {}", output.display()));
        }
        None => {
            printer.debug(&format!(
                "Use `--output {}` to write this to a file",
                resolution.default_file_name()
            ));
            printer.output(content.trim_end());
        }
    }

    Ok(ExitStatus::Success)
}

fn print_placements(printer: Printer, title: &str, placements: &[Placement]) {
    if placements.is_empty() {
        return;
    }
    printer.info(&format!("{title}:").bold().to_string());
    for placement in placements {
        let renamed = match &placement.conda_name {
            Some(conda_name) if *conda_name != placement.name => format!(" (as {conda_name})"),
            _ => String::new(),
        };
        printer.info(&format!(
            "  {}{renamed}  {}",
            placement.original.cyan(),
            placement.reason.dimmed()
        ));
    }
}
