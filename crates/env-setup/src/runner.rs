//! 단계 실행기 추상화
//!
//! [`CommandRunner`] trait은 실제 프로세스 실행([`ProcessRunner`])과
//! 테스트용 기록 실행기를 교체할 수 있게 해 줍니다.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::SetupError;
use crate::plan::{Activation, SetupStep};

/// 단계 실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepExit {
    pub success: bool,
    /// 종료 코드 (시그널로 종료된 경우 `None`)
    pub code: Option<i32>,
}

impl StepExit {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

/// 단계를 실행하는 추상 인터페이스
pub trait CommandRunner: Send + Sync {
    /// `cwd`에서 단계를 실행합니다.
    ///
    /// `step.activated`가 참이면 `activation`의 환경변수를 적용해야 합니다.
    ///
    /// # Errors
    ///
    /// 프로그램을 실행조차 할 수 없으면 [`SetupError::Spawn`]을 반환합니다.
    /// 실행 후 0이 아닌 코드로 끝난 경우는 에러가 아니라 `StepExit`로 표현합니다.
    fn run(
        &self,
        step: &SetupStep,
        cwd: &Path,
        activation: &Activation,
    ) -> impl Future<Output = Result<StepExit, SetupError>> + Send;
}

/// 실제 자식 프로세스로 단계를 실행하는 기본 구현
///
/// stdout/stderr는 부모에 그대로 연결되어 pip 출력이 사용자에게 보입니다.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        step: &SetupStep,
        cwd: &Path,
        activation: &Activation,
    ) -> Result<StepExit, SetupError> {
        let mut cmd = Command::new(&step.program);
        cmd.args(&step.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if step.activated {
            for (key, value) in activation.vars() {
                cmd.env(key, value);
            }
            for key in activation.removed_vars() {
                cmd.env_remove(key);
            }
        }

        debug!(step = %step.kind, command = %step.command_line(), "spawning step");

        let status = cmd.status().await.map_err(|e| SetupError::Spawn {
            program: step.program.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(StepExit {
            success: status.success(),
            code: status.code(),
        })
    }
}
