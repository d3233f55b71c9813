//! 개발 환경 준비 오케스트레이터
//!
//! [`EnvironmentSetup`]은 [`SetupPlan`]의 단계를 순서대로 실행하고
//! [`FailurePolicy`]에 따라 실패를 처리한 뒤 [`SetupReport`]를 돌려줍니다.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use cryoctl_core::config::SetupConfig;
use cryoctl_core::types::FailurePolicy;

use crate::error::SetupError;
use crate::plan::SetupPlan;
use crate::runner::{CommandRunner, ProcessRunner};

/// 단계별 실행 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Failed(String),
    /// 이전 단계 실패로 실행하지 않음
    Skipped,
}

/// 단계 실행 기록
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub command: String,
    pub status: StepStatus,
}

/// 전체 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub root: PathBuf,
    pub env_dir: PathBuf,
    pub policy: FailurePolicy,
    pub steps: Vec<StepReport>,
}

impl SetupReport {
    /// 모든 단계가 성공했는지 여부
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.status, StepStatus::Succeeded))
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    /// 실패한 단계가 있으면 [`SetupError::StepsFailed`]로 변환합니다.
    pub fn into_result(self) -> Result<Self, SetupError> {
        let failed: Vec<String> = self.failed_steps().map(|s| s.name.clone()).collect();
        match failed.first() {
            None => Ok(self),
            Some(first) => Err(SetupError::StepsFailed {
                failed: failed.len(),
                first: first.clone(),
            }),
        }
    }
}

/// 개발 환경 준비 실행기
pub struct EnvironmentSetup<R = ProcessRunner> {
    plan: SetupPlan,
    policy: FailurePolicy,
    runner: R,
}

impl EnvironmentSetup<ProcessRunner> {
    /// 실제 프로세스를 실행하는 인스턴스를 만듭니다.
    pub fn new(config: &SetupConfig, root: &Path) -> Self {
        Self::with_runner(config, root, ProcessRunner)
    }
}

impl<R: CommandRunner> EnvironmentSetup<R> {
    pub fn with_runner(config: &SetupConfig, root: &Path, runner: R) -> Self {
        Self {
            plan: SetupPlan::build(config, root),
            policy: config.on_failure,
            runner,
        }
    }

    /// 설정의 실패 정책을 덮어씁니다.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn plan(&self) -> &SetupPlan {
        &self.plan
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// 모든 단계를 실행합니다.
    ///
    /// 단계 실패는 보고서에 기록되며 에러로 반환되지 않습니다.
    /// 실패를 에러로 다루려면 [`SetupReport::into_result`]를 사용하세요.
    ///
    /// # Errors
    ///
    /// 센티넬 파일이 없으면 어떤 단계도 실행하지 않고
    /// [`SetupError::WrongDirectory`]를 반환합니다.
    pub async fn run(&self) -> Result<SetupReport, SetupError> {
        self.plan.check_precondition()?;

        let root = self.plan.root();
        let activation = self.plan.activation();
        let total = self.plan.steps().len();

        info!(
            root = %root.display(),
            env_dir = %self.plan.env_dir().display(),
            steps = total,
            policy = %self.policy,
            "starting environment setup"
        );

        let mut reports = Vec::with_capacity(total);
        let mut aborted = false;

        for (idx, step) in self.plan.steps().iter().enumerate() {
            let name = step.name();
            let command = step.command_line();

            if aborted {
                reports.push(StepReport {
                    name,
                    command,
                    status: StepStatus::Skipped,
                });
                continue;
            }

            info!(step = %name, position = idx + 1, total, "running setup step");

            let status = match self.runner.run(step, root, &activation).await {
                Ok(exit) if exit.success => StepStatus::Succeeded,
                Ok(exit) => StepStatus::Failed(match exit.code {
                    Some(code) => format!("exited with status {code}"),
                    None => "terminated by signal".to_owned(),
                }),
                Err(e) => StepStatus::Failed(e.to_string()),
            };

            if let StepStatus::Failed(reason) = &status {
                match self.policy {
                    FailurePolicy::Abort => {
                        error!(step = %name, reason = %reason, "setup step failed, aborting");
                        aborted = true;
                    }
                    FailurePolicy::Continue => {
                        warn!(step = %name, reason = %reason, "setup step failed, continuing");
                    }
                }
            }

            reports.push(StepReport {
                name,
                command,
                status,
            });
        }

        let report = SetupReport {
            root: root.to_path_buf(),
            env_dir: self.plan.env_dir().to_path_buf(),
            policy: self.policy,
            steps: reports,
        };

        if report.succeeded() {
            info!("environment setup completed");
        }

        Ok(report)
    }
}
