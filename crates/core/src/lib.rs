//! cryoctl 공통 크레이트
//!
//! 모든 cryoctl 크레이트가 공유하는 설정, 에러, 도메인 타입을 정의합니다.
//!
//! # 모듈 구성
//! - [`config`]: `cryoctl.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 최상위 에러 ([`CryoError`]) 및 도메인별 에러
//! - [`types`]: 공유 도메인 타입 ([`GateType`], [`FailurePolicy`])

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, CryoError, ProbeError, ServiceError, SetupFailure};

// 설정
pub use config::{CryoConfig, GeneralConfig, ServiceConfig, SetupConfig, SmokeConfig};

// 도메인 타입
pub use types::{FailurePolicy, GateType};
