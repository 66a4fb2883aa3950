//! Diagnostic logging.
//!
//! Library code emits `tracing` events; this module installs a stderr
//! subscriber for them. `PYWISE_LOG` accepts any `EnvFilter` directive
//! (`PYWISE_LOG=pywise=trace`) and takes precedence over `-v`.

use std::io::IsTerminal;

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "PYWISE_LOG";

/// The default level for the given `-v` count.
pub fn level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber.
pub fn setup_logging(verbosity: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(level(verbosity, quiet).into())
        .from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbosity > 1)
        .without_time()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(())
}
