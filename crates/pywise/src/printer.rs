//! User-facing output.
//!
//! Results go to stdout through [`Printer::output`] so they can be piped;
//! everything else goes to stderr. `--quiet` silences all of it except
//! errors.

use anstream::{eprintln, println};
use owo_colors::OwoColorize;

#[derive(Copy, Clone)]
pub struct Printer {
    /// 0 = normal, 1+ = verbose.
    verbosity: u8,
    quiet: bool,
}

impl Printer {
    pub fn new(verbosity: u8, quiet: bool) -> Self {
        Self { verbosity, quiet }
    }

    /// Print command output to stdout.
    pub fn output(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Print an informational message to stderr.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    /// Print a completed step, e.g. `Wrote environment.yml`.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {message}", "✓".green().bold());
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}: {message}", "warning".yellow().bold());
        }
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {message}", "error".red().bold());
    }

    /// Print a debug message (only at verbosity >= 1).
    pub fn debug(&self, message: &str) {
        if self.verbosity >= 1 && !self.quiet {
            eprintln!("{}: {message}", "debug".dimmed());
        }
    }
}
