//! API 응답 해석
//!
//! 서비스는 실패도 HTTP 200과 `{"success": false, "message": ...}` 본문으로
//! 돌려주므로 상태 코드가 아니라 본문으로 판정합니다.

use serde::Serialize;
use serde_json::Value;

/// 얽힘 응답 판정 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum EntanglementVerdict {
    /// 얽힘 생성 성공
    Entangled(EntanglementSummary),
    /// 서비스가 요청을 거부함
    Rejected { message: String },
    /// 기대한 형식이 아님
    Unparseable { reason: String },
}

/// 성공한 얽힘 응답의 요약
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntanglementSummary {
    pub concurrence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bell_state_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entanglement_strength: Option<String>,
    /// 서비스가 데모 모드로 응답하면 `"demo"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl EntanglementSummary {
    pub fn is_demo(&self) -> bool {
        self.mode.as_deref() == Some("demo")
    }
}

/// 얽힘 엔드포인트 응답 본문을 판정합니다.
pub fn interpret_entanglement(body: &str) -> EntanglementVerdict {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return EntanglementVerdict::Unparseable {
                reason: format!("invalid json: {e}"),
            };
        }
    };

    let Value::Object(map) = &value else {
        return EntanglementVerdict::Unparseable {
            reason: "response is not a json object".to_owned(),
        };
    };

    let success = map.get("success").is_some_and(is_truthy);
    if !success {
        let message = match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "unknown error".to_owned(),
            Some(other) => other.to_string(),
        };
        return EntanglementVerdict::Rejected { message };
    }

    let Some(concurrence) = map.get("concurrence").and_then(Value::as_f64) else {
        return EntanglementVerdict::Unparseable {
            reason: "missing numeric 'concurrence'".to_owned(),
        };
    };

    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);

    EntanglementVerdict::Entangled(EntanglementSummary {
        concurrence,
        bell_state_type: text("bell_state_type"),
        entanglement_strength: text("entanglement_strength"),
        mode: text("mode"),
    })
}

/// JSON 값의 참/거짓 판정
///
/// `null`, `false`, `0`, 빈 문자열, 빈 배열, 빈 객체가 거짓입니다.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// 루트 엔드포인트 본문에서 읽은 서비스 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RootInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RootInfo {
    /// JSON 객체가 아니면 `None`
    pub fn parse(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        let map = value.as_object()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);
        Some(Self {
            message: text("message"),
            version: text("version"),
            status: text("status"),
        })
    }
}
