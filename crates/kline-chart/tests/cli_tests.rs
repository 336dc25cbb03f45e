use std::process::Command;

fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_kline-chart"));
    command.env("RUST_LOG", "error");
    command
}

fn sample_config() -> String {
    format!("{}/examples/local_feed.yaml", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn dry_run_with_sample_config_succeeds() {
    let output = binary()
        .arg("--config")
        .arg(sample_config())
        .arg("--dry-run")
        .output()
        .expect("Failed to start kline-chart binary");

    assert!(
        output.status.success(),
        "Process exited with non-zero status: {}\nStdout: {}\nStderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn dry_run_rejects_bad_url_override() {
    let output = binary()
        .arg("--config")
        .arg(sample_config())
        .arg("--url")
        .arg("ftp://example.com")
        .arg("--dry-run")
        .output()
        .expect("Failed to start kline-chart binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("validate config"), "stderr: {stderr}");
}

#[test]
fn dry_run_with_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = binary()
        .arg("--config")
        .arg(dir.path().join("missing.yaml"))
        .arg("--dry-run")
        .output()
        .expect("Failed to start kline-chart binary");

    assert!(!output.status.success());
}

#[test]
fn init_writes_loadable_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let output = binary()
        .arg("init")
        .arg("--output")
        .arg(&path)
        .arg("--defaults")
        .output()
        .expect("Failed to start kline-chart binary");
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = kline_chart::AppConfig::from_file(&path).unwrap();
    assert_eq!(written, kline_chart::AppConfig::default());

    // refuses to overwrite without --force
    let output = binary()
        .arg("init")
        .arg("--output")
        .arg(&path)
        .arg("--defaults")
        .output()
        .expect("Failed to start kline-chart binary");
    assert!(!output.status.success());

    let output = binary()
        .arg("init")
        .arg("--output")
        .arg(&path)
        .arg("--defaults")
        .arg("--force")
        .output()
        .expect("Failed to start kline-chart binary");
    assert!(output.status.success());
}
