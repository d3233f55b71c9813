//! cryoctl.toml 통합 설정 테스트
//!
//! - cryoctl.toml.example 파싱 테스트
//! - 파일 로딩 / 기본값 대체 테스트
//! - 환경변수 우선순위 테스트

use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use cryoctl_core::config::CryoConfig;
use cryoctl_core::error::{ConfigError, CryoError};
use cryoctl_core::types::{FailurePolicy, GateType};

const EXAMPLE: &str = include_str!("../../../cryoctl.toml.example");

// =============================================================================
// cryoctl.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let config = CryoConfig::parse(EXAMPLE).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let from_file = CryoConfig::parse(EXAMPLE).expect("should parse");
    let from_code = CryoConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);
    assert_eq!(from_file.general.project_root, from_code.general.project_root);

    assert_eq!(from_file.setup.sentinel, from_code.setup.sentinel);
    assert_eq!(from_file.setup.python, from_code.setup.python);
    assert_eq!(from_file.setup.env_dir, from_code.setup.env_dir);
    assert_eq!(from_file.setup.requirements, from_code.setup.requirements);
    assert_eq!(from_file.setup.pre_commit, from_code.setup.pre_commit);
    assert_eq!(from_file.setup.verify_script, from_code.setup.verify_script);
    assert_eq!(from_file.setup.on_failure, from_code.setup.on_failure);

    assert_eq!(from_file.service.name, from_code.service.name);
    assert_eq!(from_file.service.program, from_code.service.program);
    assert_eq!(from_file.service.args, from_code.service.args);
    assert_eq!(from_file.service.pid_file, from_code.service.pid_file);
    assert_eq!(from_file.service.log_file, from_code.service.log_file);
    assert_eq!(from_file.service.match_pattern, from_code.service.match_pattern);
    assert_eq!(
        from_file.service.stop_timeout_ms,
        from_code.service.stop_timeout_ms
    );
    assert_eq!(
        from_file.service.teardown_delay_ms,
        from_code.service.teardown_delay_ms
    );

    assert_eq!(from_file.smoke.base_url, from_code.smoke.base_url);
    assert_eq!(from_file.smoke.gate_type, from_code.smoke.gate_type);
    assert_eq!(
        from_file.smoke.readiness_attempts,
        from_code.smoke.readiness_attempts
    );
    assert_eq!(
        from_file.smoke.request_timeout_secs,
        from_code.smoke.request_timeout_secs
    );
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
#[serial]
async fn load_reads_file_values() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("cryoctl.toml");
    fs::write(
        &path,
        r#"
[smoke]
base_url = "http://127.0.0.1:9100"
gate_type = "CZ"
"#,
    )
    .expect("should write config");

    let config = CryoConfig::load(&path).await.expect("should load");
    assert_eq!(config.smoke.base_url, "http://127.0.0.1:9100");
    assert_eq!(config.smoke.gate_type, GateType::Cz);
}

#[tokio::test]
#[serial]
async fn load_missing_file_is_file_not_found() {
    let dir = TempDir::new().expect("should create temp dir");
    let err = CryoConfig::load(dir.path().join("absent.toml"))
        .await
        .expect_err("missing file should fail");
    assert!(matches!(
        err,
        CryoError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn load_or_default_falls_back_when_missing() {
    let dir = TempDir::new().expect("should create temp dir");
    let config = CryoConfig::load_or_default(dir.path().join("absent.toml"))
        .await
        .expect("defaults should be used");
    assert_eq!(config.setup.sentinel, "requirements.txt");
}

#[tokio::test]
#[serial]
async fn load_or_default_still_reports_parse_errors() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("cryoctl.toml");
    fs::write(&path, "[setup\nsentinel = 1").expect("should write");

    let err = CryoConfig::load_or_default(&path)
        .await
        .expect_err("malformed file should not fall back to defaults");
    assert!(matches!(
        err,
        CryoError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_values() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("cryoctl.toml");
    fs::write(&path, "[general]\nlog_format = \"xml\"").expect("should write");

    let err = CryoConfig::load(&path).await.expect_err("should fail");
    assert!(err.to_string().contains("general.log_format"));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[tokio::test]
#[serial]
async fn env_overrides_take_precedence_over_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("cryoctl.toml");
    fs::write(
        &path,
        r#"
[setup]
on_failure = "abort"

[smoke]
base_url = "http://file-value:8000"
readiness_attempts = 3
"#,
    )
    .expect("should write config");

    // SAFETY: #[serial]로 환경변수를 건드리는 테스트를 직렬화합니다.
    unsafe {
        std::env::set_var("CRYOCTL_SMOKE_BASE_URL", "http://env-value:8000");
        std::env::set_var("CRYOCTL_SETUP_ON_FAILURE", "continue");
    }

    let config = CryoConfig::load(&path).await.expect("should load");

    unsafe {
        std::env::remove_var("CRYOCTL_SMOKE_BASE_URL");
        std::env::remove_var("CRYOCTL_SETUP_ON_FAILURE");
    }

    assert_eq!(config.smoke.base_url, "http://env-value:8000");
    assert_eq!(config.setup.on_failure, FailurePolicy::Continue);
    // 환경변수가 없는 필드는 파일 값 유지
    assert_eq!(config.smoke.readiness_attempts, 3);
}

#[tokio::test]
#[serial]
async fn invalid_env_value_is_caught_by_validation() {
    // SAFETY: #[serial]로 환경변수를 건드리는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("CRYOCTL_GENERAL_LOG_LEVEL", "chatty") };

    let dir = TempDir::new().expect("should create temp dir");
    let result = CryoConfig::load_or_default(dir.path().join("absent.toml")).await;

    unsafe { std::env::remove_var("CRYOCTL_GENERAL_LOG_LEVEL") };

    let err = result.expect_err("invalid log level from env should fail validation");
    assert!(err.to_string().contains("log_level"));
}

#[tokio::test]
#[serial]
async fn unparseable_env_value_fails_load() {
    // Given: 지원하지 않는 게이트 타입
    // SAFETY: #[serial]로 환경변수를 건드리는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("CRYOCTL_SMOKE_GATE_TYPE", "SWAP") };

    // When
    let dir = TempDir::new().expect("should create temp dir");
    let result = CryoConfig::load_or_default(dir.path().join("absent.toml")).await;

    unsafe { std::env::remove_var("CRYOCTL_SMOKE_GATE_TYPE") };

    // Then: 기본값(CNOT)으로 조용히 대체되지 않고 설정 에러로 보고됨
    let err = result.expect_err("unparseable env value must not fall back to the default");
    assert!(matches!(
        err,
        CryoError::Config(ConfigError::InvalidValue { ref field, .. })
            if field == "CRYOCTL_SMOKE_GATE_TYPE"
    ));
    assert!(err.to_string().contains("SWAP"));
}
