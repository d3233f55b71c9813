//! cryoctl 개발 환경 준비
//!
//! 프로젝트 루트에서 격리된 Python 가상 환경을 만들고 의존성을 설치한 뒤
//! 설치 검증 스크립트를 실행합니다.
//!
//! # 모듈 구성
//!
//! - [`plan`]: 설정으로부터 단계 목록 생성 (`SetupPlan`, `SetupStep`, `Activation`)
//! - [`runner`]: 단계 실행 추상화 (`CommandRunner` trait, `ProcessRunner`)
//! - [`setup`]: 오케스트레이터 (`EnvironmentSetup`, `SetupReport`)
//! - [`error`]: 도메인 에러 타입 (`SetupError`)
//!
//! # 실행 흐름
//!
//! ```text
//! check_precondition --> create-env --> (activate) --> upgrade-pip
//!     --> install requirements.txt --> install requirements-dev.txt
//!     --> pre-commit install --> verify_installation.py
//! ```

pub mod error;
pub mod plan;
pub mod runner;
pub mod setup;

pub use error::SetupError;
pub use plan::{Activation, SetupPlan, SetupStep, StepKind, check_precondition};
pub use runner::{CommandRunner, ProcessRunner, StepExit};
pub use setup::{EnvironmentSetup, SetupReport, StepReport, StepStatus};
