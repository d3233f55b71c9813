//! 스모크 테스트 실행기
//!
//! 준비 상태 프로브 후 루트 엔드포인트와 얽힘 엔드포인트를 각각 한 번씩 호출하고
//! 결과를 [`SmokeReport`]로 모읍니다. 개별 검사 실패는 에러가 아니라 보고서 항목입니다.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use cryoctl_core::config::SmokeConfig;
use cryoctl_core::types::GateType;

use crate::client::{ApiClient, HttpReply};
use crate::error::SmokeError;
use crate::readiness::{Readiness, wait_ready};
use crate::response::{EntanglementVerdict, interpret_entanglement};

/// 루트 엔드포인트 경로
pub const ROOT_PATH: &str = "/";
/// 얽힘 엔드포인트 경로
pub const ENTANGLEMENT_PATH: &str = "/entanglement/bell_state";

/// 개별 검사 결과
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub summary: String,
    /// 응답 본문 (JSON이면 파싱된 값, 아니면 문자열)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl CheckResult {
    fn pass(name: &str, summary: String, detail: Option<Value>) -> Self {
        Self {
            name: name.to_owned(),
            passed: true,
            summary,
            detail,
        }
    }

    fn fail(name: &str, summary: String, detail: Option<Value>) -> Self {
        Self {
            name: name.to_owned(),
            passed: false,
            summary,
            detail,
        }
    }
}

/// 전체 스모크 테스트 결과
#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub base_url: String,
    pub gate_type: GateType,
    pub checks: Vec<CheckResult>,
}

impl SmokeReport {
    /// 모든 검사가 통과했는지 여부
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// 실패한 검사가 있으면 [`SmokeError::ChecksFailed`]
    pub fn into_result(self) -> Result<Self, SmokeError> {
        match self.failed_count() {
            0 => Ok(self),
            failed => Err(SmokeError::ChecksFailed {
                failed,
                total: self.checks.len(),
            }),
        }
    }
}

/// 스모크 테스트
#[derive(Debug, Clone)]
pub struct SmokeTest {
    client: ApiClient,
    gate_type: GateType,
    startup_delay: Duration,
    readiness: Readiness,
}

impl SmokeTest {
    /// # Errors
    ///
    /// `base_url`이 올바르지 않거나 HTTP 클라이언트를 만들 수 없으면 에러
    pub fn from_config(config: &SmokeConfig) -> Result<Self, SmokeError> {
        Ok(Self {
            client: ApiClient::new(&config.base_url, config.request_timeout())?,
            gate_type: config.gate_type,
            startup_delay: config.startup_delay(),
            readiness: Readiness {
                path: config.readiness_path.clone(),
                attempts: config.readiness_attempts,
                interval: config.readiness_interval(),
            },
        })
    }

    /// 설정의 게이트를 덮어씁니다.
    pub fn gate_type(mut self, gate_type: GateType) -> Self {
        self.gate_type = gate_type;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// 전체 스모크 테스트를 실행합니다.
    pub async fn run(&self) -> SmokeReport {
        let base_url = self.client.base_url().to_string();
        info!(base_url = %base_url, gate_type = %self.gate_type, "running smoke test");

        if !self.startup_delay.is_zero() {
            info!(
                delay_secs = self.startup_delay.as_secs(),
                "waiting before probing service"
            );
            tokio::time::sleep(self.startup_delay).await;
        }

        let mut checks = Vec::with_capacity(3);

        if !self.readiness.disabled() {
            checks.push(match wait_ready(&self.client, &self.readiness).await {
                Ok(attempt) => CheckResult::pass(
                    "readiness",
                    format!("Service ready after {attempt} attempt(s)"),
                    None,
                ),
                Err(e) => CheckResult::fail("readiness", format!("Service not ready: {e}"), None),
            });
        }

        checks.push(self.check_root().await);
        checks.push(self.check_entanglement().await);

        let report = SmokeReport {
            base_url,
            gate_type: self.gate_type,
            checks,
        };

        if report.passed() {
            info!("smoke test passed");
        } else {
            warn!(failed = report.failed_count(), "smoke test failed");
        }
        report
    }

    /// 루트 엔드포인트 검사. HTTP 응답이 오면 상태 코드와 무관하게 통과입니다.
    pub async fn check_root(&self) -> CheckResult {
        match self.client.get(ROOT_PATH, &[]).await {
            Ok(reply) => CheckResult::pass(
                "root",
                format!("Root endpoint reachable (HTTP {})", reply.status),
                Some(body_detail(&reply)),
            ),
            Err(e) => CheckResult::fail("root", format!("Root endpoint unreachable: {e}"), None),
        }
    }

    /// 얽힘 엔드포인트 검사
    pub async fn check_entanglement(&self) -> CheckResult {
        let query = [("gate_type", self.gate_type.as_str())];
        let reply = match self.client.get(ENTANGLEMENT_PATH, &query).await {
            Ok(reply) => reply,
            Err(e) => {
                return CheckResult::fail(
                    "entanglement",
                    format!("Entanglement request failed: {e}"),
                    None,
                );
            }
        };

        let detail = Some(body_detail(&reply));
        match interpret_entanglement(&reply.body) {
            EntanglementVerdict::Entangled(summary) => {
                if summary.is_demo() {
                    warn!("entanglement endpoint answered in demo mode");
                }
                // Debug keeps the trailing ".0" on whole numbers
                CheckResult::pass(
                    "entanglement",
                    format!("Entanglement working! Concurrence: {:?}", summary.concurrence),
                    detail,
                )
            }
            EntanglementVerdict::Rejected { message } => CheckResult::fail(
                "entanglement",
                format!("Entanglement failed: {message}"),
                detail,
            ),
            EntanglementVerdict::Unparseable { reason } => {
                warn!(status = reply.status, reason = %reason, "unexpected entanglement response");
                CheckResult::fail(
                    "entanglement",
                    "Failed to parse entanglement response".to_owned(),
                    detail,
                )
            }
        }
    }
}

fn body_detail(reply: &HttpReply) -> Value {
    serde_json::from_str(&reply.body).unwrap_or_else(|_| Value::String(reply.body.clone()))
}
