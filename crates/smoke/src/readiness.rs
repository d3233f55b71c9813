//! 준비 상태 프로브 -- 고정 대기 대신 서비스 응답을 폴링

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::SmokeError;

/// 준비 상태 프로브 설정
#[derive(Debug, Clone)]
pub struct Readiness {
    pub path: String,
    /// 0이면 프로브를 건너뜁니다.
    pub attempts: u32,
    pub interval: Duration,
}

impl Readiness {
    pub fn disabled(&self) -> bool {
        self.attempts == 0
    }
}

/// 서비스가 500 미만 상태 코드로 응답할 때까지 폴링합니다.
///
/// 성공하면 응답을 받은 시도 번호(1부터)를 반환합니다.
/// 프로브가 비활성화되어 있으면 `Ok(0)`입니다.
///
/// # Errors
///
/// 모든 시도가 실패하면 [`SmokeError::NotReady`]
pub async fn wait_ready(client: &ApiClient, readiness: &Readiness) -> Result<u32, SmokeError> {
    if readiness.disabled() {
        return Ok(0);
    }

    for attempt in 1..=readiness.attempts {
        match client.get(&readiness.path, &[]).await {
            Ok(reply) if reply.status < 500 => {
                info!(attempt, status = reply.status, "service is ready");
                return Ok(attempt);
            }
            Ok(reply) => debug!(attempt, status = reply.status, "service not ready yet"),
            Err(e) => debug!(attempt, error = %e, "service not reachable yet"),
        }

        if attempt < readiness.attempts {
            tokio::time::sleep(readiness.interval).await;
        }
    }

    warn!(attempts = readiness.attempts, "service did not become ready");
    Err(SmokeError::NotReady {
        attempts: readiness.attempts,
    })
}
