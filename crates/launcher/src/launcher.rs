//! 서비스 실행기 -- 이전 인스턴스 종료 후 서비스 기동
//!
//! # 흐름
//!
//! ```text
//! stop_existing()
//!   ├─ PID 파일 → 살아 있고 명령줄이 일치하면 종료, 아니면 stale 파일 삭제
//!   └─ (pattern_fallback) 명령줄 패턴이 일치하는 남은 프로세스 종료
//! teardown delay (무언가 종료한 경우만)
//! spawn
//!   ├─ Foreground: 서비스 종료까지 대기, Ctrl-C는 SIGTERM으로 전달
//!   └─ Detached:   로그 파일로 출력, 200ms 안에 죽지 않는지 확인
//! ```
//!
//! 종료는 SIGTERM → `stop_timeout` 동안 폴링 → SIGKILL 순서로 진행합니다.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use cryoctl_core::config::{CryoConfig, ServiceConfig};

use crate::error::LauncherError;
use crate::pid_file::{PidFile, PidFileState};
use crate::process::{self, Signal};

/// 종료 여부 폴링 간격
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// SIGKILL 후 종료를 기다리는 시간
const KILL_GRACE: Duration = Duration::from_secs(1);
/// 백그라운드 기동 직후 즉시 종료 여부를 확인하기 전 대기 시간
const EARLY_EXIT_WINDOW: Duration = Duration::from_millis(200);

/// 종료한 프로세스를 찾은 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PidSource {
    PidFile,
    Pattern,
}

/// 종료된 프로세스
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminatedProcess {
    pub pid: u32,
    pub source: PidSource,
    /// SIGKILL까지 필요했는지 여부
    pub forced: bool,
}

/// 이전 인스턴스 정리 결과
///
/// 아무것도 실행 중이 아니었던 경우도 정상 결과입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StopOutcome {
    pub terminated: Vec<TerminatedProcess>,
    /// 죽은 프로세스를 가리키던 PID 파일을 삭제했는지 여부
    pub stale_pid_file: bool,
}

impl StopOutcome {
    /// 아무 프로세스도 종료하지 않았는지 여부
    pub fn is_noop(&self) -> bool {
        self.terminated.is_empty()
    }
}

/// 실행 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// 서비스가 끝날 때까지 대기
    Foreground,
    /// 백그라운드로 실행하고 즉시 반환
    Detached,
}

/// 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// 포그라운드 서비스가 종료됨
    Exited { pid: u32, code: Option<i32> },
    /// 백그라운드로 실행 중
    Detached {
        pid: u32,
        log_file: Option<PathBuf>,
    },
}

/// PID 파일 기준 인스턴스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstanceState {
    Running { pid: u32 },
    /// PID 파일은 있지만 가리키는 프로세스가 없음
    Stale { reason: String },
    NotRunning,
}

/// 서비스 실행기
#[derive(Debug, Clone)]
pub struct ServiceLauncher {
    config: ServiceConfig,
    root: PathBuf,
    env_dir: Option<PathBuf>,
    pid_file: PidFile,
    log_file: Option<PathBuf>,
}

impl ServiceLauncher {
    /// 통합 설정에서 실행기를 만듭니다. 상대 경로는 프로젝트 루트 기준입니다.
    pub fn new(config: &CryoConfig) -> Self {
        let env_dir = config
            .service
            .use_env
            .then(|| config.resolve(&config.setup.env_dir));
        Self::from_parts(config.service.clone(), config.project_root(), env_dir)
    }

    pub fn from_parts(config: ServiceConfig, root: PathBuf, env_dir: Option<PathBuf>) -> Self {
        let resolve = |p: &str| {
            let p = Path::new(p);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        let pid_file = PidFile::new(resolve(&config.pid_file));
        let log_file = (!config.log_file.trim().is_empty()).then(|| resolve(&config.log_file));

        Self {
            config,
            root,
            env_dir,
            pid_file,
            log_file,
        }
    }

    /// 패턴 매칭 보조 검색을 켜거나 끕니다.
    pub fn pattern_fallback(mut self, enabled: bool) -> Self {
        self.config.pattern_fallback = enabled;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn pid_file(&self) -> &PidFile {
        &self.pid_file
    }

    /// 실제로 실행할 프로그램 경로
    ///
    /// `python`/`python3`이고 가상 환경 인터프리터가 있으면 그것을 사용합니다.
    pub fn resolve_program(&self) -> PathBuf {
        let program = Path::new(&self.config.program);

        if matches!(self.config.program.as_str(), "python" | "python3") {
            if let Some(env_dir) = &self.env_dir {
                let bin = if cfg!(windows) { "Scripts" } else { "bin" };
                let exe = if cfg!(windows) { "python.exe" } else { "python" };
                let candidate = env_dir.join(bin).join(exe);
                if candidate.is_file() {
                    return candidate;
                }
                debug!(candidate = %candidate.display(), "environment interpreter not found");
            }
        }

        // 디렉토리가 포함된 상대 경로는 프로젝트 루트 기준으로 해석
        if program.is_relative() && program.components().count() > 1 {
            return self.root.join(program);
        }

        program.to_path_buf()
    }

    /// PID 파일로 현재 인스턴스 상태를 확인합니다.
    pub fn state(&self) -> Result<InstanceState, LauncherError> {
        Ok(match self.pid_file.read()? {
            PidFileState::Missing => InstanceState::NotRunning,
            PidFileState::Invalid(content) => InstanceState::Stale {
                reason: format!("invalid pid file content {content:?}"),
            },
            PidFileState::Pid(pid) if !process::is_alive(pid) => InstanceState::Stale {
                reason: format!("pid {pid} is not running"),
            },
            PidFileState::Pid(pid) if !self.matches_service(pid) => InstanceState::Stale {
                reason: format!("pid {pid} belongs to another program"),
            },
            PidFileState::Pid(pid) => InstanceState::Running { pid },
        })
    }

    /// 이전 인스턴스를 종료합니다.
    ///
    /// # Errors
    ///
    /// 찾은 프로세스를 종료하지 못하면 [`LauncherError::TerminateFailed`]를 반환합니다.
    pub async fn stop_existing(&self) -> Result<StopOutcome, LauncherError> {
        let mut outcome = StopOutcome::default();

        match self.state()? {
            InstanceState::NotRunning => {
                debug!(path = %self.pid_file.path().display(), "no pid file");
            }
            InstanceState::Stale { reason } => {
                info!(
                    path = %self.pid_file.path().display(),
                    reason = %reason,
                    "removing stale pid file"
                );
                self.pid_file.remove();
                outcome.stale_pid_file = true;
            }
            InstanceState::Running { pid } => {
                info!(pid, service = %self.config.name, "stopping previous instance");
                let forced = terminate(pid, self.config.stop_timeout()).await?;
                self.pid_file.remove();
                outcome.terminated.push(TerminatedProcess {
                    pid,
                    source: PidSource::PidFile,
                    forced,
                });
            }
        }

        if self.config.pattern_fallback {
            for pid in process::find_by_pattern(&self.config.match_pattern) {
                if outcome.terminated.iter().any(|t| t.pid == pid) {
                    continue;
                }
                info!(
                    pid,
                    pattern = %self.config.match_pattern,
                    "stopping process matched by pattern"
                );
                let forced = terminate(pid, self.config.stop_timeout()).await?;
                outcome.terminated.push(TerminatedProcess {
                    pid,
                    source: PidSource::Pattern,
                    forced,
                });
            }
        }

        if outcome.is_noop() {
            info!(service = %self.config.name, "no previous instance running");
        }

        Ok(outcome)
    }

    /// 이전 인스턴스를 정리한 뒤 서비스를 실행합니다.
    pub async fn launch(&self, mode: LaunchMode) -> Result<LaunchOutcome, LauncherError> {
        let stopped = self.stop_existing().await?;
        self.start(mode, &stopped).await
    }

    /// [`stop_existing`](Self::stop_existing) 이후 서비스를 기동합니다.
    ///
    /// 종료한 프로세스가 있으면 `teardown_delay`만큼 먼저 기다립니다.
    pub async fn start(
        &self,
        mode: LaunchMode,
        stopped: &StopOutcome,
    ) -> Result<LaunchOutcome, LauncherError> {
        if !stopped.is_noop() && !self.config.teardown_delay().is_zero() {
            debug!(
                delay_ms = self.config.teardown_delay_ms,
                "waiting for previous instance teardown"
            );
            tokio::time::sleep(self.config.teardown_delay()).await;
        }

        match mode {
            LaunchMode::Foreground => self.run_foreground().await,
            LaunchMode::Detached => self.spawn_detached().await,
        }
    }

    async fn run_foreground(&self) -> Result<LaunchOutcome, LauncherError> {
        let program = self.resolve_program();
        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&self.config.args).current_dir(&self.root);

        info!(
            service = %self.config.name,
            program = %program.display(),
            "starting service in foreground"
        );

        let mut child = cmd.spawn().map_err(|e| spawn_error(&program, e))?;
        let pid = child
            .id()
            .ok_or_else(|| LauncherError::EarlyExit {
                status: "exited before pid was known".to_owned(),
            })?;

        if let Err(e) = self.pid_file.write(pid) {
            let _ = child.kill().await;
            return Err(e);
        }

        let waited = supervise(
            &mut child,
            pid,
            tokio::signal::ctrl_c(),
            self.config.stop_timeout(),
        )
        .await;

        self.pid_file.remove();

        let status = waited?;
        info!(pid, status = %status, "service exited");
        Ok(LaunchOutcome::Exited {
            pid,
            code: status.code(),
        })
    }

    async fn spawn_detached(&self) -> Result<LaunchOutcome, LauncherError> {
        let program = self.resolve_program();
        let mut cmd = std::process::Command::new(&program);
        cmd.args(&self.config.args)
            .current_dir(&self.root)
            .stdin(Stdio::null());

        match &self.log_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let out = OpenOptions::new().create(true).append(true).open(path)?;
                let err = out.try_clone()?;
                cmd.stdout(out).stderr(err);
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        // 터미널의 Ctrl-C가 백그라운드 서비스에 전달되지 않도록 별도 프로세스 그룹
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        info!(
            service = %self.config.name,
            program = %program.display(),
            "starting service in background"
        );

        let mut child = cmd.spawn().map_err(|e| spawn_error(&program, e))?;
        let pid = child.id();

        tokio::time::sleep(EARLY_EXIT_WINDOW).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(LauncherError::EarlyExit {
                    status: status.to_string(),
                });
            }
            Ok(None) => {}
            Err(e) => {
                return Err(LauncherError::Spawn {
                    program: program.display().to_string(),
                    reason: format!("failed to check service status: {e}"),
                });
            }
        }

        if let Err(e) = self.pid_file.write(pid) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        info!(pid, "service started in background");
        Ok(LaunchOutcome::Detached {
            pid,
            log_file: self.log_file.clone(),
        })
    }

    /// PID가 이 서비스의 프로세스인지 명령줄로 확인합니다.
    ///
    /// 명령줄을 읽을 수 없는 플랫폼에서는 PID 파일을 신뢰합니다.
    fn matches_service(&self, pid: u32) -> bool {
        if self.config.match_pattern.is_empty() {
            return true;
        }
        match process::cmdline(pid) {
            Some(cmd) => cmd.contains(&self.config.match_pattern),
            None => true,
        }
    }
}

/// 포그라운드 서비스가 끝날 때까지 기다립니다.
///
/// `interrupt`가 `Ok`로 끝나면 SIGTERM을 전달하고 `stop_timeout` 뒤에는 강제 종료합니다.
/// 인터럽트 핸들러를 등록하지 못한 경우(`Err`)에는 서비스를 건드리지 않고 계속 기다립니다.
async fn supervise<F>(
    child: &mut tokio::process::Child,
    pid: u32,
    interrupt: F,
    stop_timeout: Duration,
) -> std::io::Result<std::process::ExitStatus>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        status = child.wait() => status,
        signal = interrupt => match signal {
            Ok(()) => {
                info!(pid, "interrupt received, stopping service");
                if let Err(e) = process::send_signal(pid, Signal::Terminate) {
                    debug!(pid, error = %e, "failed to forward SIGTERM");
                }
                match tokio::time::timeout(stop_timeout, child.wait()).await {
                    Ok(status) => status,
                    Err(_) => {
                        warn!(pid, "service ignored SIGTERM, killing");
                        let _ = child.start_kill();
                        child.wait().await
                    }
                }
            }
            Err(e) => {
                warn!(pid, error = %e, "cannot listen for interrupt, waiting for service");
                child.wait().await
            }
        },
    }
}

/// SIGTERM을 보내고 종료를 기다린 뒤, 필요하면 SIGKILL로 강제 종료합니다.
///
/// 강제 종료했으면 `true`를 반환합니다.
async fn terminate(pid: u32, timeout: Duration) -> Result<bool, LauncherError> {
    match process::send_signal(pid, Signal::Terminate) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(LauncherError::TerminateFailed {
                pid,
                reason: e.to_string(),
            });
        }
    }

    if wait_for_exit(pid, timeout).await {
        info!(pid, "process terminated");
        return Ok(false);
    }

    warn!(
        pid,
        timeout_ms = timeout.as_millis() as u64,
        "process ignored SIGTERM, sending SIGKILL"
    );

    match process::send_signal(pid, Signal::Kill) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => {
            return Err(LauncherError::TerminateFailed {
                pid,
                reason: e.to_string(),
            });
        }
    }

    if wait_for_exit(pid, KILL_GRACE).await {
        Ok(true)
    } else {
        Err(LauncherError::TerminateFailed {
            pid,
            reason: "still running after SIGKILL".to_owned(),
        })
    }
}

async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !process::is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn spawn_error(program: &Path, e: std::io::Error) -> LauncherError {
    LauncherError::Spawn {
        program: program.display().to_string(),
        reason: e.to_string(),
    }
}
