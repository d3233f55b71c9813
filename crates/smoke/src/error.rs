//! 스모크 테스트 에러 타입

use cryoctl_core::error::{CryoError, ProbeError};

/// 스모크 테스트 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    /// HTTP 클라이언트 생성 실패
    #[error("failed to build http client: {0}")]
    Client(String),

    /// 기본 URL이 올바르지 않음
    #[error("invalid base url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// 요청 전송 실패 (연결 거부, 타임아웃, 본문 읽기 실패)
    #[error("{url}: {reason}")]
    Transport { url: String, reason: String },

    /// 준비 상태 프로브 소진
    #[error("service not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    /// 검사 실패
    #[error("{failed} of {total} smoke checks failed")]
    ChecksFailed { failed: usize, total: usize },
}

impl From<SmokeError> for CryoError {
    fn from(err: SmokeError) -> Self {
        match err {
            SmokeError::NotReady { attempts } => CryoError::Smoke(ProbeError::NotReady { attempts }),
            SmokeError::ChecksFailed { failed, total } => {
                CryoError::Smoke(ProbeError::ChecksFailed { failed, total })
            }
            other => CryoError::Smoke(ProbeError::Transport(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_failed_keeps_counts() {
        let err: CryoError = SmokeError::ChecksFailed { failed: 1, total: 3 }.into();
        assert!(matches!(
            err,
            CryoError::Smoke(ProbeError::ChecksFailed { failed: 1, total: 3 })
        ));
    }

    #[test]
    fn transport_becomes_probe_transport() {
        let err: CryoError = SmokeError::Transport {
            url: "http://localhost:8000/".to_owned(),
            reason: "connection refused".to_owned(),
        }
        .into();
        match err {
            CryoError::Smoke(ProbeError::Transport(msg)) => {
                assert!(msg.contains("connection refused"));
                assert!(msg.contains("localhost:8000"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
