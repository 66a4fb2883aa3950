// The `unreachable_pub` is to silence false positives in RustRover.
#![allow(dead_code, unreachable_pub)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Insta snapshot filters shared across pywise tests.
pub const INSTA_FILTERS: &[(&str, &str)] = &[
    // Rewrite Windows output to Unix output
    (r"\\([\w\d]|\.)", "/$1"),
    (r"pywise\.exe", "pywise"),
    // pywise version display
    (
        r"pywise \d+\.\d+\.\d+(-(alpha|beta|rc)\.\d+)?(\+\d+)?",
        r"pywise [VERSION]",
    ),
    // Trim end-of-line whitespaces
    (r"([^\s])[ \t]+(\r?\n)", "$1$2"),
];

/// Returns the pywise binary that cargo built before launching the tests.
pub fn get_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pywise"))
}

/// Create a `pywise` command for testing.
pub fn pywise_command() -> Command {
    let mut command = Command::new(get_bin());
    // Clear environment variables that might interfere with tests.
    for var in [
        "PYWISE_CONFIG",
        "PYWISE_LOG",
        "VIRTUAL_ENV",
        "CONDA_DEFAULT_ENV",
        "CONDA_PREFIX",
        "PIPENV_ACTIVE",
        "CLICOLOR_FORCE",
        "FORCE_COLOR",
    ] {
        command.env_remove(var);
    }
    command
}

/// A scratch project with its own `site-packages` and `PATH`.
///
/// Commands run inside `project/`, read installed packages from
/// `site-packages/` and only see executables placed in `bin/`, so the
/// presence of conda or docker on the host never leaks into a test.
pub struct TestContext {
    pub temp_dir: TempDir,
    pub project: PathBuf,
    pub site_packages: PathBuf,
    pub bin: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_project_name("demo_app")
    }

    pub fn with_project_name(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = temp_dir.path().join(name);
        let site_packages = temp_dir.path().join("site-packages");
        let bin = temp_dir.path().join("bin");
        for dir in [&project, &site_packages, &bin] {
            fs_err::create_dir_all(dir).expect("Failed to create test directory");
        }
        Self {
            temp_dir,
            project,
            site_packages,
            bin,
        }
    }

    /// Record an installed distribution in `site-packages/`.
    pub fn install(&self, name: &str, version: &str, requires: &[&str]) -> &Self {
        let dist_info = self
            .site_packages
            .join(format!("{}-{version}.dist-info", name.replace('-', "_")));
        fs_err::create_dir_all(&dist_info).expect("Failed to create dist-info");

        let mut metadata = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
        for requirement in requires {
            metadata.push_str(&format!("Requires-Dist: {requirement}\n"));
        }
        fs_err::write(dist_info.join("METADATA"), metadata).expect("Failed to write METADATA");
        self
    }

    /// Write a file relative to the project directory.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let path = self.project.join(path);
        fs_err::write(&path, content).expect("Failed to write fixture");
        path
    }

    pub fn read(&self, path: &str) -> String {
        fs_err::read_to_string(self.project.join(path)).expect("Failed to read output")
    }

    pub fn exists(&self, path: &str) -> bool {
        self.project.join(path).exists()
    }

    /// Place an executable shell script named `name` on the test `PATH`.
    #[cfg(unix)]
    pub fn fake_tool(&self, name: &str, script: &str) -> &Self {
        use std::os::unix::fs::PermissionsExt;

        let path = self.bin.join(name);
        fs_err::write(&path, format!("#!/bin/sh\n{script}\n")).expect("Failed to write tool");
        fs_err::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make tool executable");
        self
    }

    /// A `pywise` command running in the project directory.
    pub fn command(&self) -> Command {
        let mut command = pywise_command();
        command
            .current_dir(&self.project)
            .env("PATH", &self.bin)
            .arg("--site-packages")
            .arg(&self.site_packages);
        command
    }

    /// Like [`TestContext::command`], without pointing at `site-packages/`.
    pub fn bare_command(&self) -> Command {
        let mut command = pywise_command();
        command.current_dir(&self.project).env("PATH", &self.bin);
        command
    }

    pub fn path(&self, path: &str) -> PathBuf {
        self.project.join(path)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// Snapshot test helper macro. Runs a command and asserts against an insta snapshot.
#[macro_export]
macro_rules! pywise_snapshot {
    ($filters:expr, $command:expr, @$expected:literal) => {{
        let output = $command.output().expect("Failed to execute pywise");
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let mut combined = format!(
            "success: {:?}\nexit_code: {}\n----- stdout -----\n{}\n----- stderr -----\n{}",
            output.status.success(),
            output.status.code().unwrap_or(-1),
            stdout.trim(),
            stderr.trim(),
        );

        // Apply filters
        for (pattern, replacement) in $filters.iter() {
            let re = regex::Regex::new(pattern).expect("Invalid filter regex");
            combined = re.replace_all(&combined, *replacement).to_string();
        }

        insta::assert_snapshot!(combined, @$expected);
    }};
}
