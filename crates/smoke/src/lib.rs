//! cryoctl 스모크 테스트
//!
//! 실행 중인 서비스에 HTTP 요청을 보내 동작 여부를 확인합니다.
//!
//! # 모듈 구성
//!
//! - [`client`]: 타임아웃이 적용된 HTTP 클라이언트 (`ApiClient`)
//! - [`readiness`]: 준비 상태 폴링 (`wait_ready`)
//! - [`response`]: 응답 본문 해석 (`interpret_entanglement`, `RootInfo`)
//! - [`runner`]: 검사 실행 및 보고서 (`SmokeTest`, `SmokeReport`)
//! - [`error`]: 도메인 에러 타입 (`SmokeError`)

pub mod client;
pub mod error;
pub mod readiness;
pub mod response;
pub mod runner;

pub use client::{ApiClient, HttpReply};
pub use error::SmokeError;
pub use readiness::{Readiness, wait_ready};
pub use response::{
    EntanglementSummary, EntanglementVerdict, RootInfo, interpret_entanglement, is_truthy,
};
pub use runner::{CheckResult, ENTANGLEMENT_PATH, ROOT_PATH, SmokeReport, SmokeTest};
