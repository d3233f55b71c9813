//! 설정 관리 — cryoctl.toml 파싱 및 런타임 설정
//!
//! [`CryoConfig`]는 모든 서브커맨드의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CRYOCTL_SMOKE_BASE_URL=http://...` 형식)
//! 3. 설정 파일 (`cryoctl.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), cryoctl_core::error::CryoError> {
//! use cryoctl_core::config::CryoConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = CryoConfig::load("cryoctl.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = CryoConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, CryoError};
use crate::types::{FailurePolicy, GateType};

/// 설정 파일 기본 이름
pub const DEFAULT_CONFIG_FILE: &str = "cryoctl.toml";

/// cryoctl 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CryoConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 개발 환경 준비 설정
    #[serde(default)]
    pub setup: SetupConfig,
    /// 서비스 실행 설정
    #[serde(default)]
    pub service: ServiceConfig,
    /// 스모크 테스트 설정
    #[serde(default)]
    pub smoke: SmokeConfig,
}

impl CryoConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CryoError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 파일이 있으면 [`load`](Self::load)와 같고, 없으면 기본값에 환경변수만 적용합니다.
    ///
    /// `--config`를 명시하지 않은 실행에서 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, CryoError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(CryoError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file absent, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides()?;
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, CryoError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CryoError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                CryoError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, CryoError> {
        toml::from_str(toml_str).map_err(|e| {
            CryoError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CRYOCTL_{SECTION}_{FIELD}`
    ///
    /// 파싱할 수 없는 값은 무시하지 않고 `ConfigError::InvalidValue`로 반환합니다.
    pub fn apply_env_overrides(&mut self) -> Result<(), CryoError> {
        // General
        override_string(&mut self.general.log_level, "CRYOCTL_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CRYOCTL_GENERAL_LOG_FORMAT");
        override_string(
            &mut self.general.project_root,
            "CRYOCTL_GENERAL_PROJECT_ROOT",
        );

        // Setup
        override_string(&mut self.setup.sentinel, "CRYOCTL_SETUP_SENTINEL");
        override_string(&mut self.setup.python, "CRYOCTL_SETUP_PYTHON");
        override_string(&mut self.setup.env_dir, "CRYOCTL_SETUP_ENV_DIR");
        override_csv(&mut self.setup.requirements, "CRYOCTL_SETUP_REQUIREMENTS");
        override_parsed(&mut self.setup.pre_commit, "CRYOCTL_SETUP_PRE_COMMIT")?;
        override_string(
            &mut self.setup.verify_script,
            "CRYOCTL_SETUP_VERIFY_SCRIPT",
        );
        override_parsed(&mut self.setup.on_failure, "CRYOCTL_SETUP_ON_FAILURE")?;

        // Service
        override_string(&mut self.service.name, "CRYOCTL_SERVICE_NAME");
        override_string(&mut self.service.program, "CRYOCTL_SERVICE_PROGRAM");
        override_csv(&mut self.service.args, "CRYOCTL_SERVICE_ARGS");
        override_parsed(&mut self.service.use_env, "CRYOCTL_SERVICE_USE_ENV")?;
        override_string(&mut self.service.pid_file, "CRYOCTL_SERVICE_PID_FILE");
        override_string(&mut self.service.log_file, "CRYOCTL_SERVICE_LOG_FILE");
        override_string(
            &mut self.service.match_pattern,
            "CRYOCTL_SERVICE_MATCH_PATTERN",
        );
        override_parsed(
            &mut self.service.pattern_fallback,
            "CRYOCTL_SERVICE_PATTERN_FALLBACK",
        )?;
        override_parsed(
            &mut self.service.stop_timeout_ms,
            "CRYOCTL_SERVICE_STOP_TIMEOUT_MS",
        )?;
        override_parsed(
            &mut self.service.teardown_delay_ms,
            "CRYOCTL_SERVICE_TEARDOWN_DELAY_MS",
        )?;

        // Smoke
        override_string(&mut self.smoke.base_url, "CRYOCTL_SMOKE_BASE_URL");
        override_parsed(&mut self.smoke.gate_type, "CRYOCTL_SMOKE_GATE_TYPE")?;
        override_parsed(
            &mut self.smoke.startup_delay_secs,
            "CRYOCTL_SMOKE_STARTUP_DELAY_SECS",
        )?;
        override_string(
            &mut self.smoke.readiness_path,
            "CRYOCTL_SMOKE_READINESS_PATH",
        );
        override_parsed(
            &mut self.smoke.readiness_attempts,
            "CRYOCTL_SMOKE_READINESS_ATTEMPTS",
        )?;
        override_parsed(
            &mut self.smoke.readiness_interval_ms,
            "CRYOCTL_SMOKE_READINESS_INTERVAL_MS",
        )?;
        override_parsed(
            &mut self.smoke.request_timeout_secs,
            "CRYOCTL_SMOKE_REQUEST_TIMEOUT_SECS",
        )?;
        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CryoError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        for (field, value) in [
            ("setup.sentinel", &self.setup.sentinel),
            ("setup.python", &self.setup.python),
            ("setup.env_dir", &self.setup.env_dir),
            ("service.program", &self.service.program),
            ("service.pid_file", &self.service.pid_file),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must not be empty".to_owned()));
            }
        }

        if self.service.pattern_fallback && self.service.match_pattern.trim().is_empty() {
            return Err(invalid(
                "service.match_pattern",
                "must not be empty when pattern_fallback is enabled".to_owned(),
            ));
        }

        if !(self.smoke.base_url.starts_with("http://")
            || self.smoke.base_url.starts_with("https://"))
        {
            return Err(invalid(
                "smoke.base_url",
                "must start with http:// or https://".to_owned(),
            ));
        }

        if self.smoke.request_timeout_secs == 0 {
            return Err(invalid(
                "smoke.request_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        if !self.smoke.readiness_path.starts_with('/') {
            return Err(invalid(
                "smoke.readiness_path",
                "must start with '/'".to_owned(),
            ));
        }

        Ok(())
    }

    /// 프로젝트 루트 경로
    pub fn project_root(&self) -> PathBuf {
        PathBuf::from(&self.general.project_root)
    }

    /// 프로젝트 루트 기준으로 경로를 해석합니다. 절대 경로는 그대로 반환합니다.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root().join(path)
        }
    }
}

fn invalid(field: &str, reason: String) -> CryoError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 프로젝트 루트 (센티넬 파일이 있는 디렉토리)
    pub project_root: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            project_root: ".".to_owned(),
        }
    }
}

/// 개발 환경 준비 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// 프로젝트 루트 확인용 센티넬 파일
    pub sentinel: String,
    /// 가상 환경 생성에 사용할 인터프리터
    pub python: String,
    /// 가상 환경 디렉토리 (프로젝트 루트 기준)
    pub env_dir: String,
    /// 설치할 의존성 매니페스트 (순서대로 설치)
    pub requirements: Vec<String>,
    /// pre-commit 훅 등록 여부
    pub pre_commit: bool,
    /// 설치 검증 스크립트 (빈 문자열이면 생략)
    pub verify_script: String,
    /// 단계 실패 시 처리 정책
    pub on_failure: FailurePolicy,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            sentinel: "requirements.txt".to_owned(),
            python: "python3".to_owned(),
            env_dir: "venv".to_owned(),
            requirements: vec![
                "requirements.txt".to_owned(),
                "requirements-dev.txt".to_owned(),
            ],
            pre_commit: true,
            verify_script: "verify_installation.py".to_owned(),
            on_failure: FailurePolicy::Abort,
        }
    }
}

/// 서비스 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 서비스 이름 (로그 / 출력 표시용)
    pub name: String,
    /// 실행 파일
    pub program: String,
    /// 실행 인자
    pub args: Vec<String>,
    /// 가상 환경의 인터프리터를 우선 사용할지 여부
    pub use_env: bool,
    /// PID 파일 경로 (프로젝트 루트 기준)
    pub pid_file: String,
    /// 백그라운드 실행 시 stdout/stderr 기록 파일 (빈 문자열이면 버림)
    pub log_file: String,
    /// 명령줄 매칭 패턴
    pub match_pattern: String,
    /// PID 파일 외에 패턴 매칭으로도 이전 인스턴스를 찾을지 여부
    pub pattern_fallback: bool,
    /// SIGTERM 후 SIGKILL까지 대기 시간 (밀리초)
    pub stop_timeout_ms: u64,
    /// 이전 인스턴스 종료 후 기동 전 대기 시간 (밀리초)
    pub teardown_delay_ms: u64,
}

impl ServiceConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn teardown_delay(&self) -> Duration {
        Duration::from_millis(self.teardown_delay_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "quantum-api".to_owned(),
            program: "python".to_owned(),
            args: vec!["src/api/quantum_api.py".to_owned()],
            use_env: true,
            pid_file: ".cryoctl/quantum-api.pid".to_owned(),
            log_file: ".cryoctl/quantum-api.log".to_owned(),
            match_pattern: "quantum_api".to_owned(),
            pattern_fallback: true,
            stop_timeout_ms: 5_000,
            teardown_delay_ms: 2_000,
        }
    }
}

/// 스모크 테스트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    /// 서비스 기본 URL
    pub base_url: String,
    /// 얽힘 엔드포인트에 보낼 게이트
    pub gate_type: GateType,
    /// 프로브 전 고정 대기 시간 (초)
    pub startup_delay_secs: u64,
    /// 준비 상태 확인 경로
    pub readiness_path: String,
    /// 준비 상태 확인 최대 시도 횟수 (0이면 프로브 생략)
    pub readiness_attempts: u32,
    /// 준비 상태 확인 간격 (밀리초)
    pub readiness_interval_ms: u64,
    /// 요청별 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl SmokeConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            gate_type: GateType::Cnot,
            startup_delay_secs: 0,
            readiness_path: "/".to_owned(),
            readiness_attempts: 20,
            readiness_interval_ms: 500,
            request_timeout_secs: 10,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T>(target: &mut T, env_key: &str) -> Result<(), CryoError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(e) => {
                warn!(env_key, value = val.as_str(), "failed to parse env var");
                return Err(CryoError::Config(ConfigError::InvalidValue {
                    field: env_key.to_owned(),
                    reason: format!("cannot parse '{val}': {e}"),
                }));
            }
        }
    }
    Ok(())
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
