//! PID 파일 -- 실행 중인 서비스 인스턴스의 명시적 핸들
//!
//! 이름 패턴으로 프로세스를 찾는 대신 기동 시 기록한 PID로 이전 인스턴스를 찾습니다.
//!
//! # 보안
//!
//! - `create_new(true)`로 원자적으로 생성 (TOCTOU 방지)
//! - 생성된 파일이 일반 파일인지 확인 (심볼릭 링크 공격 방지)
//! - 상위 디렉토리는 0o700, 파일은 0o600 권한

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::LauncherError;

/// PID 파일을 읽은 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidFileState {
    /// 파일 없음
    Missing,
    /// 내용이 유효한 PID가 아님
    Invalid(String),
    /// 기록된 PID
    Pid(u32),
}

/// PID 파일 핸들
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID 파일을 읽습니다.
    ///
    /// # Errors
    ///
    /// 파일이 없는 경우는 에러가 아니라 [`PidFileState::Missing`]입니다.
    /// 그 외 읽기 실패는 [`LauncherError::PidFile`]을 반환합니다.
    pub fn read(&self) -> Result<PidFileState, LauncherError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PidFileState::Missing),
            Err(e) => {
                return Err(LauncherError::PidFile {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        Ok(parse_pid(&content))
    }

    /// PID를 기록합니다.
    ///
    /// # Errors
    ///
    /// - 파일이 이미 있으면 [`LauncherError::AlreadyRunning`]
    /// - 일반 파일이 아니면 [`LauncherError::PidFile`]
    pub fn write(&self, pid: u32) -> Result<(), LauncherError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                let mut builder = fs::DirBuilder::new();
                builder.mode(0o700).recursive(true);
                builder.create(parent)?;
            }
            #[cfg(not(unix))]
            {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let existing = fs::read_to_string(&self.path)
                    .map(|s| s.trim().to_owned())
                    .unwrap_or_else(|_| "unknown".to_owned());
                return Err(LauncherError::AlreadyRunning {
                    path: self.path.clone(),
                    pid: existing,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata()?;
        if !metadata.is_file() {
            let _ = fs::remove_file(&self.path);
            return Err(LauncherError::PidFile {
                path: self.path.clone(),
                reason: "not a regular file".to_owned(),
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        writeln!(file, "{pid}")?;

        info!(pid, path = %self.path.display(), "pid file written");
        Ok(())
    }

    /// PID 파일을 삭제합니다. 실패해도 경고만 남깁니다.
    pub fn remove(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "pid file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove pid file"
            ),
        }
    }
}

/// PID 파일 내용을 해석합니다. 0은 프로세스 그룹을 뜻하므로 거부합니다.
fn parse_pid(content: &str) -> PidFileState {
    let trimmed = content.trim();
    match trimmed.parse::<u32>() {
        Ok(pid) if pid > 0 && pid <= i32::MAX as u32 => PidFileState::Pid(pid),
        _ => PidFileState::Invalid(trimmed.to_owned()),
    }
}
