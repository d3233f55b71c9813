//! OS 프로세스 조회 및 시그널 전송
//!
//! 명령줄 조회와 패턴 검색은 Linux의 `/proc`에 의존합니다.
//! 다른 플랫폼에서는 조회 결과가 비어 있습니다.

use std::io;

use tracing::warn;

/// 전송할 시그널
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGTERM
    Terminate,
    /// SIGKILL
    Kill,
}

/// 프로세스가 살아 있는지 확인합니다.
///
/// 권한이 없어 시그널을 보낼 수 없는 프로세스도 살아 있는 것으로 봅니다.
/// Linux에서는 좀비 프로세스를 종료된 것으로 봅니다.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    if !valid_pid(pid) {
        return false;
    }

    // SAFETY: kill(2) with signal 0 performs only an existence/permission check.
    let result = unsafe { libc::kill(pid as libc::pid_t, 0) };

    let exists = if result == 0 {
        true
    } else {
        io::Error::last_os_error().kind() == io::ErrorKind::PermissionDenied
    };

    exists && !is_zombie(pid)
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    warn!("process liveness check not supported on this platform");
    false
}

/// 프로세스에 시그널을 보냅니다.
///
/// # Errors
///
/// - 프로세스가 없으면 `ErrorKind::NotFound`
/// - 권한이 없으면 `ErrorKind::PermissionDenied`
/// - 0 또는 범위를 벗어난 PID는 `ErrorKind::InvalidInput`
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: Signal) -> io::Result<()> {
    if !valid_pid(pid) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to signal pid {pid}"),
        ));
    }

    let signo = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };

    // SAFETY: pid is a positive single-process id, so no process group is targeted.
    let result = unsafe { libc::kill(pid as libc::pid_t, signo) };
    if result == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Err(io::Error::new(io::ErrorKind::NotFound, err))
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
pub fn send_signal(pid: u32, _signal: Signal) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("signalling pid {pid} is not supported on this platform"),
    ))
}

/// 프로세스의 명령줄 (인자를 공백으로 이은 문자열)
#[cfg(target_os = "linux")]
pub fn cmdline(pid: u32) -> Option<String> {
    let raw = std::fs::read(format!("/proc/{pid}/cmdline")).ok()?;
    if raw.is_empty() {
        // 커널 스레드 또는 좀비
        return None;
    }
    let joined: Vec<String> = raw
        .split(|b| *b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect();
    Some(joined.join(" "))
}

#[cfg(not(target_os = "linux"))]
pub fn cmdline(_pid: u32) -> Option<String> {
    None
}

/// 명령줄에 `pattern`이 포함된 프로세스의 PID 목록
///
/// 현재 프로세스와 부모 프로세스는 제외합니다.
#[cfg(target_os = "linux")]
pub fn find_by_pattern(pattern: &str) -> Vec<u32> {
    if pattern.is_empty() {
        return Vec::new();
    }

    let entries = match std::fs::read_dir("/proc") {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "cannot scan /proc for matching processes");
            return Vec::new();
        }
    };

    let own = std::process::id();
    let parent = parent_pid();

    let mut pids: Vec<u32> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .filter(|pid| *pid != own && Some(*pid) != parent)
        .filter(|pid| cmdline(*pid).is_some_and(|cmd| cmd.contains(pattern)))
        .filter(|pid| !is_zombie(*pid))
        .collect();
    pids.sort_unstable();
    pids
}

#[cfg(not(target_os = "linux"))]
pub fn find_by_pattern(pattern: &str) -> Vec<u32> {
    warn!(pattern, "pattern-based process lookup not supported on this platform");
    Vec::new()
}

#[cfg(unix)]
fn valid_pid(pid: u32) -> bool {
    pid > 0 && pid <= i32::MAX as u32
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    // /proc/<pid>/stat: "pid (comm) S ..." -- comm 안에 괄호가 올 수 있으므로 마지막 ')' 기준
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, rest) = stat.rsplit_once(')')?;
            rest.split_whitespace().next().map(|state| state == "Z")
        })
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: u32) -> bool {
    false
}

#[cfg(target_os = "linux")]
fn parent_pid() -> Option<u32> {
    // SAFETY: getppid(2) has no preconditions and cannot fail.
    let ppid = unsafe { libc::getppid() };
    u32::try_from(ppid).ok()
}
