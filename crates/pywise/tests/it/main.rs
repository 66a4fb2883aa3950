//! Integration tests for pywise.
//!
//! Following the single-integration-test pattern from:
//! <https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html>

pub(crate) mod common;

mod detect;
mod dockerize;
mod help;
mod multi_env;
mod settings;
mod venv_to_conda;
mod verbosity;
mod version;
