//! Integration tests for cryoctl command handlers.
//!
//! Handlers are driven directly (not through `run`) because the global
//! tracing subscriber can only be installed once per process.

use std::fs;
use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;

use cryoctl_cli::cli::{
    ConfigAction, ConfigArgs, LaunchArgs, OutputFormat, SetupArgs, SmokeArgs,
};
use cryoctl_cli::commands::{self, ConfigSource};
use cryoctl_cli::output::OutputWriter;
use cryoctl_core::config::CryoConfig;

fn writer() -> OutputWriter {
    OutputWriter::new(OutputFormat::Text)
}

fn config_in(root: &Path) -> CryoConfig {
    let mut config = CryoConfig::default();
    config.general.project_root = root.display().to_string();
    config.service.pattern_fallback = false;
    config
}

/// Base URL on which nothing is listening.
fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

// =============================================================================
// setup
// =============================================================================

#[tokio::test]
async fn test_setup_outside_project_root_exits_1() {
    // Given: a directory without requirements.txt
    let dir = TempDir::new().expect("should create temp dir");
    let config = config_in(dir.path());

    // When
    let err = commands::setup::execute(
        SetupArgs {
            dry_run: false,
            keep_going: false,
        },
        &config,
        &writer(),
    )
    .await
    .expect_err("setup must fail outside the project root");

    // Then: wrong-directory message, nothing created
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("requirements.txt not found"));
    assert!(!dir.path().join("venv").exists(), "no step may run");
}

#[tokio::test]
async fn test_setup_outside_project_root_prints_no_progress() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = config_in(dir.path());
    let writer = OutputWriter::buffered(OutputFormat::Text);

    let err = commands::setup::execute(
        SetupArgs {
            dry_run: false,
            keep_going: false,
        },
        &config,
        &writer,
    )
    .await
    .expect_err("setup must fail outside the project root");

    assert_eq!(err.exit_code(), 1);
    assert!(
        writer.contents().is_empty(),
        "wrong-directory error must come before any progress line, got: {}",
        writer.contents()
    );
}

#[tokio::test]
async fn test_setup_dry_run_executes_nothing() {
    let dir = TempDir::new().expect("should create temp dir");
    fs::write(dir.path().join("requirements.txt"), "numpy\n").expect("write");
    let config = config_in(dir.path());

    commands::setup::execute(
        SetupArgs {
            dry_run: true,
            keep_going: false,
        },
        &config,
        &writer(),
    )
    .await
    .expect("dry run should succeed");

    assert!(!dir.path().join("venv").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_setup_failed_step_exits_1() {
    let dir = TempDir::new().expect("should create temp dir");
    fs::write(dir.path().join("requirements.txt"), "numpy\n").expect("write");
    let mut config = config_in(dir.path());
    config.setup.python = "false".to_owned();

    let err = commands::setup::execute(
        SetupArgs {
            dry_run: false,
            keep_going: true,
        },
        &config,
        &writer(),
    )
    .await
    .expect_err("failing steps must surface");

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("create-env"));
}

// =============================================================================
// launch / stop / status
// =============================================================================

#[tokio::test]
async fn test_stop_with_nothing_running_succeeds() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = config_in(dir.path());

    commands::stop::execute(&config, &writer())
        .await
        .expect("stop with nothing running is not an error");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_launch_detached_then_stop() {
    let dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(dir.path());
    config.service.program = "sleep".to_owned();
    config.service.args = vec!["86390".to_owned()];
    config.service.match_pattern = "sleep 86390".to_owned();
    config.service.teardown_delay_ms = 0;

    commands::launch::execute(
        LaunchArgs {
            detach: true,
            wait_ready: false,
            no_pattern: true,
        },
        &config,
        &writer(),
    )
    .await
    .expect("detached launch should succeed");

    let pid_file = dir.path().join(&config.service.pid_file);
    assert!(pid_file.exists(), "pid file should be written");

    commands::stop::execute(&config, &writer())
        .await
        .expect("stop should succeed");
    assert!(!pid_file.exists(), "pid file should be removed");
}

#[tokio::test]
async fn test_status_never_fails() {
    let dir = TempDir::new().expect("should create temp dir");
    let mut config = config_in(dir.path());
    config.smoke.base_url = closed_base_url();
    config.smoke.request_timeout_secs = 1;

    commands::status::execute(&config, &writer())
        .await
        .expect("status reports, it does not fail");
}

// =============================================================================
// smoke
// =============================================================================

fn smoke_args(allow_failures: bool) -> SmokeArgs {
    SmokeArgs {
        gate_type: None,
        base_url: Some(closed_base_url()),
        allow_failures,
    }
}

fn quick_smoke_config() -> CryoConfig {
    let mut config = CryoConfig::default();
    config.smoke.readiness_attempts = 1;
    config.smoke.readiness_interval_ms = 10;
    config.smoke.request_timeout_secs = 1;
    config
}

#[tokio::test]
async fn test_smoke_against_unreachable_service_exits_4() {
    let err = commands::smoke::execute(smoke_args(false), &quick_smoke_config(), &writer())
        .await
        .expect_err("unreachable service fails the smoke test");
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_smoke_allow_failures_exits_0() {
    commands::smoke::execute(smoke_args(true), &quick_smoke_config(), &writer())
        .await
        .expect("--allow-failures keeps exit status 0");
}

#[tokio::test]
async fn test_smoke_invalid_base_url_is_config_error() {
    let args = SmokeArgs {
        gate_type: None,
        base_url: Some("localhost:8000".to_owned()),
        allow_failures: false,
    };
    let err = commands::smoke::execute(args, &quick_smoke_config(), &writer())
        .await
        .expect_err("invalid url must fail");
    assert_eq!(err.exit_code(), 2);
}

// =============================================================================
// config
// =============================================================================

#[tokio::test]
#[serial]
async fn test_explicit_missing_config_is_exit_2() {
    let source = ConfigSource::Explicit("/nonexistent/cryoctl.toml".into());
    let err = source.load().await.expect_err("missing explicit file");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
#[serial]
async fn test_absent_default_config_uses_defaults() {
    let dir = TempDir::new().expect("should create temp dir");
    let source = ConfigSource::Default(dir.path().join("cryoctl.toml"));

    let config = source.load().await.expect("defaults should load");

    assert_eq!(config.smoke.base_url, "http://localhost:8000");
    assert_eq!(source.describe(), "(built-in defaults)");
}

#[tokio::test]
#[serial]
async fn test_config_validate_invalid_file_is_exit_2() {
    // Given: a file with an invalid value
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("cryoctl.toml");
    fs::write(&path, "[smoke]\nbase_url = \"localhost:8000\"\n").expect("write");

    // When
    let err = commands::config::execute(
        ConfigArgs {
            action: ConfigAction::Validate,
        },
        &ConfigSource::Explicit(path),
        &writer(),
    )
    .await
    .expect_err("invalid config must fail validation");

    // Then
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
#[serial]
async fn test_config_show_section_json_carries_values() {
    // Given: a file overriding the service name
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("cryoctl.toml");
    fs::write(&path, "[service]\nname = \"quantum-api-dev\"\n").expect("write");
    let writer = OutputWriter::buffered(OutputFormat::Json);

    // When
    commands::config::execute(
        ConfigArgs {
            action: ConfigAction::Show {
                section: Some("service".to_owned()),
            },
        },
        &ConfigSource::Explicit(path),
        &writer,
    )
    .await
    .expect("show should succeed");

    // Then: the selected section is part of the JSON document
    let json: serde_json::Value =
        serde_json::from_str(&writer.contents()).expect("output should be JSON");
    assert_eq!(json["section"], "service");
    assert_eq!(json["config"]["name"], "quantum-api-dev");
    assert_eq!(json["config"]["program"], "python");
}

#[tokio::test]
#[serial]
async fn test_config_show_all_json_includes_every_section() {
    let dir = TempDir::new().expect("should create temp dir");
    let source = ConfigSource::Default(dir.path().join("cryoctl.toml"));
    let writer = OutputWriter::buffered(OutputFormat::Json);

    commands::config::execute(
        ConfigArgs {
            action: ConfigAction::Show { section: None },
        },
        &source,
        &writer,
    )
    .await
    .expect("show should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&writer.contents()).expect("output should be JSON");
    assert_eq!(json["source"], "(built-in defaults)");
    assert_eq!(json["config"]["smoke"]["base_url"], "http://localhost:8000");
    assert_eq!(json["config"]["service"]["name"], "quantum-api");
}

#[tokio::test]
#[serial]
async fn test_unparseable_env_override_is_exit_2() {
    let dir = TempDir::new().expect("should create temp dir");
    let source = ConfigSource::Default(dir.path().join("cryoctl.toml"));

    // SAFETY: serialized test, no other thread reads the environment concurrently.
    unsafe { std::env::set_var("CRYOCTL_SERVICE_STOP_TIMEOUT_MS", "soon") };
    let result = source.load().await;
    unsafe { std::env::remove_var("CRYOCTL_SERVICE_STOP_TIMEOUT_MS") };

    let err = result.expect_err("unparseable override must not be ignored");
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("CRYOCTL_SERVICE_STOP_TIMEOUT_MS"));
}

#[tokio::test]
#[serial]
async fn test_env_override_applies_to_default_source() {
    let dir = TempDir::new().expect("should create temp dir");
    let source = ConfigSource::Default(dir.path().join("cryoctl.toml"));

    // SAFETY: serialized test, no other thread reads the environment concurrently.
    unsafe { std::env::set_var("CRYOCTL_SMOKE_BASE_URL", "http://127.0.0.1:9000") };
    let result = source.load().await;
    unsafe { std::env::remove_var("CRYOCTL_SMOKE_BASE_URL") };

    let config = result.expect("should load");
    assert_eq!(config.smoke.base_url, "http://127.0.0.1:9000");
}
