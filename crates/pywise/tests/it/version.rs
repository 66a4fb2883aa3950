use crate::common::pywise_command;

#[test]
fn version_flag_shows_version() {
    let mut cmd = pywise_command();
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.starts_with("pywise "),
        "Expected version string starting with 'pywise ', got: {stdout}"
    );
}

#[test]
fn short_version_flag_works() {
    let mut cmd = pywise_command();
    cmd.arg("-V");

    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.starts_with("pywise "),
        "Expected version string starting with 'pywise ', got: {stdout}"
    );
}
