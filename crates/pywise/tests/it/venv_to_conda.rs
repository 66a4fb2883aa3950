use pywise::manifest::CondaEnvironment;

use crate::common::TestContext;

fn context() -> TestContext {
    let context = TestContext::new();
    context
        .install("numpy", "1.26.4", &[])
        .install("pandas", "2.2.0", &["numpy>=1.22"])
        .install("requests", "2.31.0", &[])
        .install("setuptools", "69.0.0", &[]);
    context.write("requirements.txt", "numpy\npandas\nrequests\n");
    context
}

fn read_environment(context: &TestContext) -> CondaEnvironment {
    let content = context.read("environment.yml");
    CondaEnvironment::from_yaml(&content, &context.path("environment.yml")).unwrap()
}

#[test]
fn writes_environment_without_creating() {
    let context = context();
    let mut cmd = context.command();
    cmd.env("VIRTUAL_ENV", context.root().join(".venv"))
        .args(["venv-to-conda", "--no-create", "--python-version", "3.11"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("conda env create -f environment.yml"), "{stderr}");

    let environment = read_environment(&context);
    assert_eq!(environment.name.as_deref(), Some("demo-app"));
    assert_eq!(
        environment.conda_packages().collect::<Vec<_>>(),
        vec!["python=3.11", "numpy", "pandas", "pip"]
    );
    assert_eq!(
        environment.pip_packages().collect::<Vec<_>>(),
        vec!["requests==2.31.0"]
    );
    // Nothing was created, so nothing is backed up.
    assert!(context.exists("requirements.txt"));
}

#[test]
fn refuses_inside_conda() {
    let context = context();
    let mut cmd = context.command();
    cmd.env("CONDA_DEFAULT_ENV", "base")
        .args(["venv-to-conda", "--no-create"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("the current environment is conda"), "{stderr}");
    assert!(!context.exists("environment.yml"));
}

#[test]
fn requires_conda() {
    let context = context();
    let mut cmd = context.command();
    cmd.arg("venv-to-conda");

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("`conda` was not found on PATH"), "{stderr}");
    assert!(stderr.contains("--no-create"), "{stderr}");
}

#[cfg(unix)]
#[test]
fn creates_environment_and_backs_up_requirements() {
    let context = context();
    context.fake_tool("conda", r#"echo "$@" > "${0%/*}/conda-args""#);

    let mut cmd = context.command();
    cmd.args(["venv-to-conda", "--name", "analytics", "--keep-venv"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "{stderr}");
    assert_eq!(stdout.trim(), "conda activate analytics");
    assert!(stderr.contains("Conda packages: 2"), "{stderr}");
    assert!(stderr.contains("Pip packages: 1"), "{stderr}");
    assert!(stderr.contains("Old virtualenv preserved"), "{stderr}");

    let args = fs_err::read_to_string(context.bin.join("conda-args")).unwrap();
    assert_eq!(args.trim(), "env create -f environment.yml");
    assert!(!context.exists("requirements.txt"));
    assert_eq!(
        context.read("requirements.txt.backup"),
        "numpy\npandas\nrequests\n"
    );
    assert_eq!(read_environment(&context).name.as_deref(), Some("analytics"));
}

#[cfg(unix)]
#[test]
fn conda_failure_propagates_exit_code() {
    let context = context();
    context.fake_tool("conda", "exit 5");

    let mut cmd = context.command();
    cmd.arg("venv-to-conda");

    let output = cmd.output().expect("Failed to execute pywise");

    assert_eq!(output.status.code(), Some(5));
    assert!(context.exists("requirements.txt"));
    assert!(!context.exists("requirements.txt.backup"));
}
