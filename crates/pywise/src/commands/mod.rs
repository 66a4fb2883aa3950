//! Command dispatch for pywise.
//!
//! Every subcommand has a handler module here. Handlers share a
//! [`Context`]: the working directory, the loaded settings and the source of
//! installed-package metadata.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::environment::{InstalledPackage, Inventory, find_python};
use crate::printer::Printer;
use crate::settings::Settings;

mod detect;
mod dockerize;
mod migrate;
mod multi_env;
mod resolve;
mod venv_to_conda;

/// Exit status for pywise commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command succeeded.
    Success,

    /// The command refused to run on the given input.
    Failure,

    /// The command failed with an unexpected error.
    Error,

    /// The command's exit status is propagated from an external command.
    External(u8),
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Failure => Self::from(1),
            ExitStatus::Error => Self::from(2),
            ExitStatus::External(code) => Self::from(code),
        }
    }
}

/// State shared by every command handler.
#[derive(Debug)]
pub struct Context {
    pub cwd: PathBuf,
    pub settings: Settings,
    python: Option<PathBuf>,
    site_packages: Option<PathBuf>,
}

impl Context {
    /// Resolve the working directory and load `.pywise.yml` unless
    /// `--no-config` was given.
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
        let settings = if global.no_config {
            debug!("Ignoring configuration files (--no-config)");
            Settings::default()
        } else {
            Settings::load(global.config.as_deref(), &cwd)?
        };
        Ok(Self {
            cwd,
            settings,
            python: global.python.clone(),
            site_packages: global.site_packages.clone(),
        })
    }

    /// Where installed packages are read from: `--site-packages`, else pip
    /// through the located interpreter.
    pub fn inventory(&self) -> Result<Inventory> {
        if let Some(dir) = &self.site_packages {
            return Ok(Inventory::SitePackages(dir.clone()));
        }
        let python = find_python(self.python.as_deref())?;
        Ok(Inventory::Pip(python))
    }

    pub async fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let inventory = self.inventory()?;
        debug!("Reading installed packages from {}", inventory.describe());
        let packages = inventory.packages().await.with_context(|| {
            format!("Failed to list installed packages from {}", inventory.describe())
        })?;
        debug!("Found {} installed package(s)", packages.len());
        Ok(packages)
    }

    /// The working directory's name, used as a default project name.
    pub fn project_name(&self) -> Option<String> {
        dir_name(&self.cwd)
    }
}

fn dir_name(dir: &Path) -> Option<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Dispatch a parsed CLI command to the appropriate handler.
pub async fn dispatch(cli: Cli, printer: Printer) -> Result<ExitStatus> {
    debug!("Running `pywise {}`", cli.command.name());
    let ctx = Context::new(&cli.global)?;

    match cli.command {
        Commands::Detect(args) => detect::execute(&args, &ctx, printer).await,
        Commands::VenvToConda(args) => venv_to_conda::execute(&args, &ctx, printer).await,
        Commands::Resolve(args) => resolve::execute(&args, &ctx, printer).await,
        Commands::Migrate(args) => migrate::execute(&args, printer),
        Commands::Dockerize(args) => dockerize::execute(&args, &ctx, printer).await,
        Commands::MultiEnv(args) => multi_env::execute(&args, &ctx, printer).await,
    }
}
