//! `pywise migrate`: convert a dependency file to another format.

use anyhow::Result;

use crate::cli::MigrateArgs;
use crate::commands::ExitStatus;
use crate::error::ManifestError;
use crate::manifest;
use crate::printer::Printer;

/// Execute `pywise migrate`.
pub(super) fn execute(args: &MigrateArgs, printer: Printer) -> Result<ExitStatus> {
    let migration = match manifest::migrate(
        &args.source,
        args.to,
        args.output.as_deref(),
        args.include_dev,
    ) {
        Ok(migration) => migration,
        // Refusals about the input itself, not failures.
        Err(err @ (ManifestError::NoDependencies(_) | ManifestError::OutputIsSource(_))) => {
            printer.error(&err.to_string());
            return Ok(ExitStatus::Failure);
        }
        Err(err) => return Err(err.into()),
    };

    printer.success(&format!(
        "Migrated {} ({}) to {} ({})",
        args.source.display(),
        migration.source_format,
        migration.output.display(),
        migration.target_format
    ));
    printer.info(&format!("  Packages: {}", migration.packages_converted));

    Ok(ExitStatus::Success)
}
