use crate::common::TestContext;

#[test]
fn unknown_keys_are_rejected() {
    let context = TestContext::new();
    context.write(".pywise.yml", "resolve:\n  stratgy: pip-only\n");

    let mut cmd = context.command();
    cmd.args(["resolve", "numpy"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Failed to parse"), "{stderr}");
    assert!(stderr.contains("stratgy"), "{stderr}");
}

#[test]
fn explicit_config_file() {
    let context = TestContext::new();
    context.install("shop", "1.0", &[]).install("internal", "0.1", &[]);
    let config = context.root().join("shared.yml");
    fs_err::write(&config, "detect:\n  exclude_packages: [internal]\n").unwrap();

    let mut cmd = context.command();
    cmd.arg("--config").arg(&config).args(["detect", "--json"]);

    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_count"], 1);
    assert_eq!(report["primary_packages"][0]["name"], "shop");
}

#[test]
fn config_variable_must_exist() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.env("PYWISE_CONFIG", context.root().join("missing.yml"))
        .args(["resolve", "numpy"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("PYWISE_CONFIG is set to"), "{stderr}");
}

#[test]
fn config_found_in_parent_directory() {
    let context = TestContext::new();
    fs_err::write(context.root().join(".pywise.yml"), "resolve:\n  strategy: conda-only\n").unwrap();

    let mut cmd = context.command();
    cmd.args(["resolve", "flask"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("Conda environment `hybrid-env` ready"), "{stderr}");
}
