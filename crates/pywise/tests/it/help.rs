use crate::common::pywise_command;

#[test]
fn help_shows_all_commands() {
    let mut cmd = pywise_command();
    cmd.arg("help");

    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for command in [
        "detect",
        "venv-to-conda",
        "resolve",
        "migrate",
        "dockerize",
        "multi-env",
    ] {
        assert!(stdout.contains(command), "`{command}` missing from help: {stdout}");
    }
    assert!(stdout.contains("--site-packages"));
    assert!(stdout.contains("Use `pywise help <command>` for more information"));
}

#[test]
fn help_resolve() {
    let mut cmd = pywise_command();
    cmd.args(["help", "resolve"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Split packages between conda and pip"));
    assert!(stdout.contains("--strategy"));
    assert!(stdout.contains("conda-only"));
    assert!(stdout.contains("pip-only"));
}

#[test]
fn help_migrate_lists_formats() {
    let mut cmd = pywise_command();
    cmd.args(["migrate", "--help"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for format in ["pip", "conda", "poetry", "pipenv"] {
        assert!(stdout.contains(format), "`{format}` missing from help: {stdout}");
    }
}

#[test]
fn unknown_command_errors() {
    let mut cmd = pywise_command();
    cmd.arg("nonexistent");

    let output = cmd.output().expect("Failed to execute pywise");

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn no_args_shows_help() {
    let mut cmd = pywise_command();

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    // clap errors with "requires a subcommand" when no subcommand given
    assert!(!output.status.success());
    assert!(
        stderr.contains("Usage") || stderr.contains("subcommand"),
        "Expected usage info in stderr, got: {stderr}"
    );
}

#[test]
fn build_without_tag_is_a_usage_error() {
    let mut cmd = pywise_command();
    cmd.args(["dockerize", "--build"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("--tag"), "Expected --tag in error, got: {stderr}");
}
