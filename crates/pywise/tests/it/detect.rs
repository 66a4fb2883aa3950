use crate::common::{INSTA_FILTERS, TestContext};
use crate::pywise_snapshot;

/// Three apps sharing a library, plus support packages and dev tools.
fn context() -> TestContext {
    let context = TestContext::new();
    context
        .install("app-a", "1.0", &["shared-lib"])
        .install("app-b", "2.0", &["shared-lib"])
        .install("app-c", "3.0", &["shared-lib", "requests>=2"])
        .install("shared-lib", "0.5", &[])
        .install(
            "requests",
            "2.31.0",
            &["urllib3<3,>=1.21.1", "idna<4,>=2.5", "PySocks!=1.5.7; extra == \"socks\""],
        )
        .install("urllib3", "2.2.0", &[])
        .install("idna", "3.6", &[])
        .install("pytest", "8.0.0", &[])
        .install("pip", "24.0", &[]);
    context
}

#[test]
fn table_with_dependents() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["detect", "--show-dependents"]);

    pywise_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----
    Package   Version  Source  Dependents
    app-a     1.0      pip     none
    app-b     2.0      pip     none
    app-c     3.0      pip     none
    requests  2.31.0   pip     app-c
    ----- stderr -----
    Primary packages (4 found)
    Environment: system
    ");
}

#[test]
fn json_report() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["detect", "--json", "--include-dev"]);

    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_count"], 5);
    assert_eq!(report["environment_type"], "system");

    let names: Vec<&str> = report["primary_packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|package| package["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["app-a", "app-b", "app-c", "pytest", "requests"]);

    let requests = &report["primary_packages"][4];
    assert_eq!(requests["version"], "2.31.0");
    assert_eq!(requests["source"], "pip");
    assert_eq!(requests["editable"], false);
    assert_eq!(requests["dependents"], serde_json::json!(["app-c"]));
}

#[test]
fn excluded_packages_from_settings() {
    let context = context();
    context.write(".pywise.yml", "detect:\n  exclude_packages: [App_B]\n  include_dev: true\n");

    let mut cmd = context.command();
    cmd.args(["detect", "--json"]);

    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_count"], 4);
    let names: Vec<&str> = report["primary_packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|package| package["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"app-b"), "{names:?}");
    assert!(names.contains(&"pytest"), "{names:?}");
}

#[test]
fn no_config_ignores_settings() {
    let context = context();
    context.write(".pywise.yml", "detect:\n  exclude_packages: [app-b]\n");

    let mut cmd = context.command();
    cmd.args(["detect", "--json", "--no-config"]);

    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_count"], 4);
}

#[test]
fn writes_requirements() {
    let context = context();
    let mut cmd = context.command();
    cmd.args(["detect", "-o", "requirements.txt"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("Wrote 4 primary package(s) to requirements.txt"), "{stderr}");

    insta::assert_snapshot!(context.read("requirements.txt"), @r"
    # Generated by pywise

    app-a==1.0
    app-b==2.0
    app-c==3.0
    requests==2.31.0
    ");
}

#[test]
fn editable_installs_are_reported() {
    let context = context();
    fs_err::write(
        context.site_packages.join("app_a-1.0.dist-info").join("direct_url.json"),
        r#"{"url": "file:///src/app-a", "dir_info": {"editable": true}}"#,
    )
    .unwrap();

    let mut cmd = context.command();
    cmd.args(["detect", "--json"]);

    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["primary_packages"][0]["name"], "app-a");
    assert_eq!(report["primary_packages"][0]["editable"], true);
    assert_eq!(report["primary_packages"][1]["editable"], false);
}

#[test]
fn nothing_installed() {
    let context = TestContext::new();
    let mut cmd = context.command();
    cmd.arg("detect");

    pywise_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    warning: No primary packages detected.
    ");
}

#[test]
fn missing_site_packages_is_an_error() {
    let context = TestContext::new();
    let mut cmd = context.bare_command();
    cmd.args(["--site-packages", "does-not-exist", "detect"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Failed to list installed packages"), "{stderr}");
    assert!(stderr.contains("Caused by"), "{stderr}");
}

#[test]
fn latin1_metadata_does_not_abort_the_scan() {
    let context = TestContext::new();
    context.install("flask", "3.0.0", &[]);
    let dist_info = context.site_packages.join("oldpkg-0.9.dist-info");
    fs_err::create_dir_all(&dist_info).unwrap();
    fs_err::write(
        dist_info.join("METADATA"),
        b"Name: oldpkg\nVersion: 0.9\nAuthor: Jos\xe9\n".as_slice(),
    )
    .unwrap();

    let mut cmd = context.command();
    cmd.args(["detect", "--json"]);
    let output = cmd.output().expect("Failed to execute pywise");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("\"oldpkg\""), "{stdout}");
    assert!(stdout.contains("\"flask\""), "{stdout}");
}
