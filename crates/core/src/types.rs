//! 도메인 타입 — 여러 크레이트가 공유하는 공통 타입

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 벨 상태 생성에 사용할 2큐비트 게이트
///
/// 서비스의 `/entanglement/bell_state` 엔드포인트가 `gate_type` 쿼리로 받는 값입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateType {
    /// Controlled-NOT
    #[default]
    #[serde(rename = "CNOT")]
    Cnot,
    /// Controlled-Z
    #[serde(rename = "CZ")]
    Cz,
}

impl GateType {
    /// 쿼리 문자열에 들어가는 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cnot => "CNOT",
            Self::Cz => "CZ",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateType {
    type Err = String;

    /// 대소문자를 구분하지 않습니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CNOT" | "CX" => Ok(Self::Cnot),
            "CZ" => Ok(Self::Cz),
            _ => Err(format!("unknown gate type '{s}', expected CNOT or CZ")),
        }
    }
}

/// 개발 환경 준비 중 단계 실패 시 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// 첫 실패에서 중단하고 남은 단계는 건너뜀
    #[default]
    Abort,
    /// 실패해도 남은 단계를 계속 실행
    Continue,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            _ => Err(format!(
                "unknown failure policy '{s}', expected abort or continue"
            )),
        }
    }
}
