//! 서비스 실행기 에러 타입
//!
//! `From<LauncherError> for CryoError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use std::path::PathBuf;

use cryoctl_core::error::{CryoError, ServiceError};

/// 서비스 실행기 도메인 에러
///
/// "이전 인스턴스 없음"은 에러가 아닙니다 ([`StopOutcome`](crate::StopOutcome) 참고).
/// 여기에는 발견했지만 처리하지 못한 경우만 들어갑니다.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// 프로세스를 찾았지만 종료하지 못함
    #[error("failed to terminate pid {pid}: {reason}")]
    TerminateFailed {
        /// 대상 PID
        pid: u32,
        /// 실패 사유
        reason: String,
    },

    /// PID 파일이 이미 존재함 (다른 인스턴스가 실행 중)
    #[error("pid file {} already exists with pid {pid}, is another instance running?", path.display())]
    AlreadyRunning {
        /// PID 파일 경로
        path: PathBuf,
        /// 파일에 기록된 PID
        pid: String,
    },

    /// 서비스 프로세스를 실행할 수 없음
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// 실행하려던 프로그램
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 백그라운드 실행 직후 서비스가 종료됨
    #[error("service exited immediately with status: {status}")]
    EarlyExit {
        /// 종료 상태
        status: String,
    },

    /// PID 파일 처리 실패
    #[error("pid file {}: {reason}", path.display())]
    PidFile {
        /// PID 파일 경로
        path: PathBuf,
        /// 실패 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LauncherError> for CryoError {
    fn from(err: LauncherError) -> Self {
        match err {
            LauncherError::TerminateFailed { pid, reason } => {
                CryoError::Service(ServiceError::TerminateFailed { pid, reason })
            }
            LauncherError::Spawn { .. } | LauncherError::EarlyExit { .. } => {
                CryoError::Service(ServiceError::StartFailed(err.to_string()))
            }
            LauncherError::AlreadyRunning { .. } | LauncherError::PidFile { .. } => {
                CryoError::Service(ServiceError::PidFile(err.to_string()))
            }
            LauncherError::Io(e) => CryoError::Io(e),
        }
    }
}
