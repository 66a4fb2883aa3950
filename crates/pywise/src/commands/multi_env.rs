//! `pywise multi-env`: requirement files and an overview config per
//! deployment environment.

use anyhow::Result;

use crate::cli::MultiEnvArgs;
use crate::commands::{Context, ExitStatus};
use crate::multi_env::{CONFIG_FILE_NAME, MultiEnvPlan};
use crate::printer::Printer;

/// Execute `pywise multi-env`.
pub(super) async fn execute(args: &MultiEnvArgs, ctx: &Context, printer: Printer) -> Result<ExitStatus> {
    let mut environments: Vec<String> = Vec::with_capacity(args.environments.len());
    for env in &args.environments {
        if let Err(reason) = validate_env_name(env) {
            printer.error(&format!("Invalid environment name `{env}`: {reason}"));
            return Ok(ExitStatus::Failure);
        }
        if !environments.contains(env) {
            environments.push(env.clone());
        }
    }

    let packages = ctx.installed_packages().await?;
    let project = ctx.project_name().unwrap_or_else(|| "project".to_owned());
    let plan = MultiEnvPlan::new(&project, &environments, &packages, &args.python_version)?;

    for path in plan.write(&ctx.cwd)? {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        printer.success(&format!("Created {file_name}"));
    }
    printer.info(&format!("Environments: {}", environments.join(", ")));
    printer.info(&format!("Main config: {CONFIG_FILE_NAME}"));

    Ok(ExitStatus::Success)
}

/// Environment names become part of file names.
fn validate_env_name(env: &str) -> Result<(), &'static str> {
    if env.is_empty() {
        return Err("must not be empty");
    }
    if env.contains(['/', '\\']) || env == "." || env == ".." {
        return Err("must not contain path separators");
    }
    Ok(())
}
