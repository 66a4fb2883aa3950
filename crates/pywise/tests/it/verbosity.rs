use crate::common::TestContext;

fn context() -> TestContext {
    let context = TestContext::new();
    context.write("requirements.txt", "numpy>=1.26\nflask\n");
    context
}

#[test]
fn quiet_suppresses_progress() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["--quiet", "migrate", "requirements.txt", "--to", "pipenv"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(
        stderr.is_empty(),
        "Expected no output with --quiet, got: {stderr}"
    );
    assert!(context.exists("Pipfile"));
}

#[test]
fn quiet_still_reports_errors() {
    let context = TestContext::new();
    context.write("requirements.txt", "# nothing yet\n");
    let mut cmd = context.command();
    cmd.args(["-q", "migrate", "requirements.txt", "--to", "conda"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("does not declare any dependencies"),
        "Expected the refusal with --quiet, got: {stderr}"
    );
}

#[test]
fn verbose_enables_debug_logging() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["migrate", "requirements.txt", "--to", "pipenv", "-v"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(
        stderr.contains("Running `pywise migrate`"),
        "Expected debug logging with -v, got: {stderr}"
    );
}

#[test]
fn log_variable_overrides_verbosity() {
    let context = context();
    let mut cmd = context.command();
    cmd.env("PYWISE_LOG", "off")
        .args(["-vv", "migrate", "requirements.txt", "--to", "pipenv"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success());
    assert!(
        !stderr.contains("Running `pywise migrate`"),
        "Expected PYWISE_LOG=off to silence logging, got: {stderr}"
    );
}

#[test]
fn quiet_wins_over_verbose() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["-q", "-v", "migrate", "requirements.txt", "--to", "pipenv"]);

    let output = cmd.output().expect("Failed to execute pywise");

    assert!(output.status.success());
    assert!(output.stderr.is_empty());
}
