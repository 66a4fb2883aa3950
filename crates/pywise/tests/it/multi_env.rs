use pywise::multi_env::MultiEnvConfig;

use crate::common::{INSTA_FILTERS, TestContext};
use crate::pywise_snapshot;

fn context() -> TestContext {
    let context = TestContext::new();
    context
        .install("Flask", "3.0.0", &[])
        .install("black", "24.2.0", &[])
        .install("pip", "24.0", &[]);
    context
}

#[test]
fn default_environments() {
    let context = context();
    let mut cmd = context.command();
    cmd.arg("multi-env");

    pywise_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    ✓ Created requirements-dev.txt
    ✓ Created requirements-staging.txt
    ✓ Created requirements-prod.txt
    ✓ Created pywise-multi-env.yml
    Environments: dev, staging, prod
    Main config: pywise-multi-env.yml
    ");

    insta::assert_snapshot!(context.read("requirements-dev.txt"), @r"
    # Dev environment

    black==24.2.0
    Flask==3.0.0
    pytest
    flake8
    mypy
    ");
    insta::assert_snapshot!(context.read("requirements-prod.txt"), @r"
    # Prod environment

    black==24.2.0
    Flask==3.0.0
    ");

    let config: MultiEnvConfig =
        serde_yaml::from_str(&context.read("pywise-multi-env.yml")).unwrap();
    assert_eq!(config.project, "demo_app");
    assert_eq!(config.environments.len(), 3);
    let staging = &config.environments["staging"];
    assert_eq!(staging.requirements_file, "requirements-staging.txt");
    assert_eq!(staging.python_version, "3.11");
    assert_eq!(staging.environment_variables["LOG_LEVEL"], "INFO");
    assert_eq!(staging.environment_variables["DEBUG"], "False");
}

#[test]
fn custom_environments() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["multi-env", "-e", "qa", "-e", "prod", "-e", "qa", "--python-version", "3.12"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("Environments: qa, prod"), "{stderr}");
    assert!(context.exists("requirements-qa.txt"));
    assert!(!context.exists("requirements-dev.txt"));

    let config: MultiEnvConfig =
        serde_yaml::from_str(&context.read("pywise-multi-env.yml")).unwrap();
    let qa = &config.environments["qa"];
    assert_eq!(qa.python_version, "3.12");
    assert!(!qa.environment_variables.contains_key("DEBUG"));
    assert_eq!(qa.environment_variables["PYTHONUNBUFFERED"], "1");
}

#[test]
fn rejects_path_like_names() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["multi-env", "-e", "dev", "-e", "../prod"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("Invalid environment name `../prod`"), "{stderr}");
    assert!(!context.exists("requirements-dev.txt"));
}
