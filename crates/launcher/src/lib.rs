//! cryoctl 서비스 실행기
//!
//! 이전에 실행된 서비스 인스턴스를 정리하고 새 인스턴스를 기동합니다.
//! 이전 인스턴스는 기동 시 기록한 PID 파일로 찾고, 설정에 따라
//! 명령줄 패턴 검색을 보조 수단으로 사용합니다.
//!
//! # 모듈 구성
//!
//! - [`launcher`]: 종료/기동 오케스트레이션 (`ServiceLauncher`)
//! - [`pid_file`]: PID 파일 읽기/쓰기
//! - [`process`]: 시그널 전송, 생존 확인, 패턴 검색
//! - [`error`]: 도메인 에러 타입 (`LauncherError`)

pub mod error;
pub mod launcher;
pub mod pid_file;
pub mod process;

pub use error::LauncherError;
pub use launcher::{
    InstanceState, LaunchMode, LaunchOutcome, PidSource, ServiceLauncher, StopOutcome,
    TerminatedProcess,
};
pub use pid_file::{PidFile, PidFileState};
