//! CLI argument definitions for pywise.
//!
//! All clap derive structs live here. The [`Cli`] struct is the top-level
//! parser; [`Commands`] enumerates every subcommand.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};

use crate::manifest::Format;
use crate::resolver::Strategy;

/// Clap v3-style help menu colors.
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Smart Python dependency management on top of pip, conda, poetry and pipenv.
#[derive(Parser, Debug)]
#[command(
    name = "pywise",
    author,
    version,
    about = "Smart Python dependency management on top of pip, conda, poetry and pipenv.",
    styles = STYLES,
    after_help = "Use `pywise help <command>` for more information on a specific command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase logging verbosity.
    #[arg(global = true, short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(global = true, short, long)]
    pub quiet: bool,

    /// Read settings from this file instead of discovering `.pywise.yml`
    /// [env: PYWISE_CONFIG].
    #[arg(global = true, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ignore `.pywise.yml`.
    #[arg(global = true, long, conflicts_with = "config")]
    pub no_config: bool,

    /// The Python interpreter whose packages are inspected.
    #[arg(global = true, long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Read installed packages from a site-packages directory instead of
    /// asking pip.
    #[arg(global = true, long, value_name = "DIR", conflicts_with = "python")]
    pub site_packages: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the packages you installed on purpose.
    Detect(DetectArgs),

    /// Convert the current virtualenv into a conda environment.
    VenvToConda(VenvToCondaArgs),

    /// Split packages between conda and pip.
    Resolve(ResolveArgs),

    /// Convert a dependency file to another format.
    Migrate(MigrateArgs),

    /// Generate a Dockerfile for the current project.
    Dockerize(DockerizeArgs),

    /// Generate requirement files for dev, staging and prod.
    MultiEnv(MultiEnvArgs),
}

impl Commands {
    /// Return the subcommand name as a static string (for diagnostics).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Detect(_) => "detect",
            Self::VenvToConda(_) => "venv-to-conda",
            Self::Resolve(_) => "resolve",
            Self::Migrate(_) => "migrate",
            Self::Dockerize(_) => "dockerize",
            Self::MultiEnv(_) => "multi-env",
        }
    }
}

/// Arguments for `pywise detect`.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Format used with `--output`.
    #[arg(long, value_enum, default_value_t = Format::Pip)]
    pub format: Format,

    /// Write the primary packages to a dependency file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report development tools (pytest, black, ...) too.
    #[arg(long)]
    pub include_dev: bool,

    /// Show which installed packages depend on each primary package.
    #[arg(long)]
    pub show_dependents: bool,

    /// Print the result as JSON.
    #[arg(long, conflicts_with = "show_dependents")]
    pub json: bool,
}

/// Arguments for `pywise venv-to-conda`.
#[derive(Args, Debug)]
pub struct VenvToCondaArgs {
    /// Name of the conda environment [default: current directory name].
    #[arg(short, long)]
    pub name: Option<String>,

    /// Python version for the environment, e.g. `3.11`.
    #[arg(long)]
    pub python_version: Option<String>,

    /// Keep the old virtualenv (only changes the suggested next steps).
    #[arg(long)]
    pub keep_venv: bool,

    /// Only write `environment.yml`; don't create the environment.
    #[arg(long)]
    pub no_create: bool,
}

/// Arguments for `pywise resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Requirement specifiers, e.g. `numpy>=1.26 flask`.
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// How to split packages [default: hybrid].
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Write the resolved environment to a file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Name of the conda environment.
    #[arg(short, long, default_value = crate::resolver::DEFAULT_ENV_NAME)]
    pub name: String,
}

/// Arguments for `pywise migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// The dependency file to convert.
    pub source: PathBuf,

    /// Target format.
    #[arg(long, value_enum)]
    pub to: Format,

    /// Output file [default: the target format's conventional file name].
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include development dependencies in formats without a dev section.
    #[arg(long)]
    pub include_dev: bool,
}

/// Arguments for `pywise dockerize`.
#[derive(Args, Debug)]
pub struct DockerizeArgs {
    /// Python version for the base image [default: 3.11].
    #[arg(long)]
    pub python_version: Option<String>,

    /// Install dependencies in a separate build stage.
    #[arg(long)]
    pub multi_stage: bool,

    /// Don't merge layers or set container-friendly Python variables.
    #[arg(long)]
    pub no_optimize: bool,

    /// Run `docker build` after writing the Dockerfile.
    #[arg(long, requires = "tag")]
    pub build: bool,

    /// Image tag for `--build`.
    #[arg(long, short)]
    pub tag: Option<String>,
}

/// Arguments for `pywise multi-env`.
#[derive(Args, Debug)]
pub struct MultiEnvArgs {
    /// Environments to generate.
    #[arg(
        short,
        long = "environments",
        value_name = "ENV",
        default_values = ["dev", "staging", "prod"]
    )]
    pub environments: Vec<String>,

    /// Python version recorded for every environment.
    #[arg(long, default_value = "3.11")]
    pub python_version: String,
}
