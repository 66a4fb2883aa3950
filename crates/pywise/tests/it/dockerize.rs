use crate::common::{INSTA_FILTERS, TestContext};
use crate::pywise_snapshot;

fn flask_project() -> TestContext {
    let context = TestContext::new();
    context
        .install("Flask", "3.0.0", &["Werkzeug>=3.0"])
        .install("Werkzeug", "3.0.1", &[])
        .install("Pillow", "10.2.0", &[]);
    context.write("requirements.txt", "flask==3.0.0\npillow==10.2.0\n");
    context
}

#[test]
fn web_project() {
    let context = flask_project();
    let mut cmd = context.command();
    cmd.arg("dockerize");

    pywise_snapshot!(&INSTA_FILTERS, cmd, @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    ✓ Created Dockerfile
    ✓ Created .dockerignore
    Docker image
      Project type: Web
      Web framework: flask (port 5000)
      System dependencies: 2
      Estimated size: 165 MB
    ");

    insta::assert_snapshot!(context.read("Dockerfile"), @r#"
    FROM python:3.11-slim

    ENV PYTHONDONTWRITEBYTECODE=1 \
        PYTHONUNBUFFERED=1

    # Set working directory
    WORKDIR /app

    # Install system dependencies
    RUN apt-get update && apt-get install -y --no-install-recommends \
        libjpeg-dev zlib1g-dev \
        && rm -rf /var/lib/apt/lists/*

    # Copy and install Python dependencies
    COPY requirements.txt .
    RUN pip install --no-cache-dir -r requirements.txt

    # Copy application code
    COPY . .

    # Create non-root user
    RUN groupadd -r appuser && useradd -r -g appuser appuser && chown -R appuser:appuser /app
    USER appuser

    EXPOSE 5000
    CMD ["python", "app.py"]
    "#);

    let dockerignore = context.read(".dockerignore");
    assert!(dockerignore.contains("__pycache__/"));
    assert!(dockerignore.contains(".venv/"));
}

#[test]
fn multi_stage_from_settings() {
    let context = TestContext::new();
    context.install("numpy", "1.26.4", &[]);
    context.write("requirements.txt", "numpy==1.26.4\n");
    context.write(".pywise.yml", "docker:\n  multi_stage: true\n");

    let mut cmd = context.command();
    cmd.args(["dockerize", "--python-version", "3.12"]);
    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("Project type: ML"), "{stderr}");

    let dockerfile = context.read("Dockerfile");
    assert!(dockerfile.starts_with("FROM python:3.12-slim AS builder\n"), "{dockerfile}");
    assert!(dockerfile.contains("--prefix=/install -r requirements.txt"), "{dockerfile}");
    assert!(dockerfile.contains("COPY --from=builder /install /usr/local"), "{dockerfile}");
    // Compilers and headers stay in the builder.
    assert_eq!(dockerfile.matches("apt-get install").count(), 1, "{dockerfile}");
    assert!(dockerfile.ends_with("CMD [\"python\", \"main.py\"]\n"), "{dockerfile}");
}

#[test]
fn no_optimize_splits_layers() {
    let context = flask_project();
    let mut cmd = context.command();
    cmd.args(["dockerize", "--no-optimize"]);
    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());

    let dockerfile = context.read("Dockerfile");
    assert!(!dockerfile.contains("PYTHONDONTWRITEBYTECODE"), "{dockerfile}");
    assert!(dockerfile.contains("RUN chown -R appuser:appuser /app\n"), "{dockerfile}");
}

#[test]
fn base_image_from_settings() {
    let context = flask_project();
    context.write(".pywise.yml", "docker:\n  base_image: registry.local/python:3.11\n");

    let mut cmd = context.command();
    cmd.arg("dockerize");
    let output = cmd.output().expect("Failed to execute pywise");
    assert!(output.status.success());
    assert!(context.read("Dockerfile").starts_with("FROM registry.local/python:3.11\n"));
}

#[test]
fn invalid_python_version() {
    let context = flask_project();
    let mut cmd = context.command();
    cmd.args(["dockerize", "--python-version", "3"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Invalid Python version `3`"), "{stderr}");
    assert!(!context.exists("Dockerfile"));
}

#[test]
fn without_package_metadata() {
    let context = TestContext::new();
    let mut cmd = context.bare_command();
    cmd.arg("dockerize");

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("generating a generic Dockerfile"), "{stderr}");
    assert!(stderr.contains("the image installs no dependencies"), "{stderr}");
    assert!(context.read("Dockerfile").contains("CMD [\"python\", \"main.py\"]"));
}

#[test]
fn build_without_docker() {
    let context = flask_project();
    let mut cmd = context.command();
    cmd.args(["dockerize", "--build", "--tag", "shop:latest"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("`docker` was not found on PATH"), "{stderr}");
    // The files are written before the build is attempted.
    assert!(context.exists("Dockerfile"));
}

#[cfg(unix)]
#[test]
fn build_runs_docker() {
    let context = flask_project();
    context.fake_tool("docker", r#"echo "$@" > "${0%/*}/docker-args""#);

    let mut cmd = context.command();
    cmd.args(["dockerize", "--build", "--tag", "shop:latest"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "{stderr}");
    assert!(stderr.contains("Built image `shop:latest`"), "{stderr}");
    let args = fs_err::read_to_string(context.bin.join("docker-args")).unwrap();
    assert_eq!(args.trim(), "build -t shop:latest .");
}

#[cfg(unix)]
#[test]
fn build_failure_propagates_exit_code() {
    let context = flask_project();
    context.fake_tool("docker", "exit 3");

    let mut cmd = context.command();
    cmd.args(["dockerize", "--build", "--tag", "shop"]);

    let output = cmd.output().expect("Failed to execute pywise");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr.contains("`docker build` exited with status 3"), "{stderr}");
}
