//! pywise: smart Python dependency management on top of pip, conda, poetry
//! and pipenv.
//!
//! This crate provides the entry point and command dispatch for the pywise
//! binary. It parses CLI arguments, sets up logging and a tokio runtime, and
//! delegates to command handlers built on the library modules below.

#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::ffi::OsString;
use std::process::ExitCode;

use anstream::eprintln;
use clap::Parser;
use owo_colors::OwoColorize;

use crate::cli::Cli;
use crate::commands::ExitStatus;
use crate::printer::Printer;

pub mod cli;
pub mod commands;
pub mod detector;
pub mod docker;
pub mod environment;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod multi_env;
pub mod normalize;
pub mod printer;
pub mod resolver;
pub mod settings;
pub mod tool;

/// Stack size of the thread the runtime runs on; TOML and YAML
/// deserialization recurse.
const MAIN_STACK_SIZE: usize = 4 * 1024 * 1024;

/// Entry point for the pywise CLI.
///
/// Parses CLI arguments, installs the logging subscriber, sets up the tokio
/// runtime on a dedicated thread and dispatches to the command handler.
pub fn main<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let printer = Printer::new(cli.global.verbose, cli.global.quiet);

    if let Err(err) = logging::setup_logging(cli.global.verbose, cli.global.quiet) {
        printer.error(&format!("Failed to initialize logging: {err:#}"));
        return ExitStatus::Error.into();
    }

    let run = move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .thread_stack_size(MAIN_STACK_SIZE)
            .build()
            .expect("failed to build tokio runtime");

        let result = runtime.block_on(commands::dispatch(cli, printer));

        runtime.shutdown_background();
        result
    };

    // Thread spawn/join failures are unrecoverable.
    let result = std::thread::Builder::new()
        .name("pywise-main".to_owned())
        .stack_size(MAIN_STACK_SIZE)
        .spawn(run)
        .expect("failed to spawn main thread")
        .join()
        .expect("main thread panicked");

    match result {
        Ok(code) => code.into(),
        Err(err) => {
            let mut causes = err.chain();
            if let Some(first) = causes.next() {
                printer.error(&first.to_string());
            }
            for cause in causes {
                eprintln!(
                    "  {}: {}",
                    "Caused by".red().bold(),
                    cause.to_string().trim()
                );
            }
            ExitStatus::Error.into()
        }
    }
}
