//! 개발 환경 준비 에러 타입
//!
//! `From<SetupError> for CryoError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use std::path::PathBuf;

use cryoctl_core::error::{CryoError, SetupFailure};

/// 개발 환경 준비 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// 센티넬 파일이 없음 -- 프로젝트 루트가 아닌 곳에서 실행됨
    #[error("{sentinel} not found in {}: run this from the project root", dir.display())]
    WrongDirectory {
        /// 찾지 못한 센티넬 파일 이름
        sentinel: String,
        /// 검사한 디렉토리
        dir: PathBuf,
    },

    /// 단계 프로그램을 실행할 수 없음
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// 실행하려던 프로그램
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 하나 이상의 단계가 실패함
    #[error("{failed} setup step(s) failed, first: {first}")]
    StepsFailed {
        /// 실패한 단계 수
        failed: usize,
        /// 처음 실패한 단계 이름
        first: String,
    },
}

impl From<SetupError> for CryoError {
    fn from(err: SetupError) -> Self {
        match err {
            SetupError::WrongDirectory { sentinel, dir } => {
                CryoError::Setup(SetupFailure::WrongDirectory {
                    sentinel,
                    dir: dir.display().to_string(),
                })
            }
            SetupError::Spawn { program, reason } => {
                CryoError::Setup(SetupFailure::StepFailed {
                    step: program,
                    reason,
                })
            }
            SetupError::StepsFailed { failed, first } => {
                CryoError::Setup(SetupFailure::StepFailed {
                    step: first,
                    reason: format!("{failed} step(s) failed"),
                })
            }
        }
    }
}
