//! 에러 타입 — 도메인별 에러 정의

/// cryoctl 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum CryoError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 개발 환경 준비 에러
    #[error("setup error: {0}")]
    Setup(#[from] SetupFailure),

    /// 서비스 프로세스 관리 에러
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// 스모크 테스트 에러
    #[error("smoke test error: {0}")]
    Smoke(#[from] ProbeError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 개발 환경 준비 에러
#[derive(Debug, thiserror::Error)]
pub enum SetupFailure {
    /// 센티넬 파일이 없음 (잘못된 작업 디렉토리)
    #[error("{sentinel} not found in {dir}")]
    WrongDirectory { sentinel: String, dir: String },

    /// 단계 실행 실패
    #[error("step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },
}

/// 서비스 프로세스 관리 에러
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 프로세스 종료 실패 (발견했지만 제거하지 못함)
    #[error("failed to terminate pid {pid}: {reason}")]
    TerminateFailed { pid: u32, reason: String },

    /// 프로세스 기동 실패
    #[error("failed to start service: {0}")]
    StartFailed(String),

    /// PID 파일 에러
    #[error("pid file error: {0}")]
    PidFile(String),
}

/// 스모크 테스트 / HTTP 프로브 에러
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// 요청 전송 실패 (연결 거부, 타임아웃 등)
    #[error("request failed: {0}")]
    Transport(String),

    /// 서비스가 준비 상태에 도달하지 못함
    #[error("service not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    /// 하나 이상의 검사가 실패함
    #[error("{failed} of {total} smoke checks failed")]
    ChecksFailed { failed: usize, total: usize },
}
