//! CLI-specific error types and exit code mapping

use cryoctl_core::error::{CryoError, ProbeError};
use cryoctl_env_setup::SetupError;
use cryoctl_launcher::LauncherError;
use cryoctl_smoke::SmokeError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The service did not answer (e.g. `launch --wait-ready`).
    #[error("service not reachable: {0}")]
    ServiceUnavailable(String),

    /// One or more smoke checks failed.
    #[error("smoke test failed: {0}")]
    SmokeFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success                                   |
    /// | 1    | General / command error (incl. setup)     |
    /// | 2    | Configuration error                       |
    /// | 3    | Service unreachable                       |
    /// | 4    | Smoke checks failed                       |
    /// | 10   | IO error                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::ServiceUnavailable(_) => 3,
            Self::SmokeFailed(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<CryoError> for CliError {
    fn from(e: CryoError) -> Self {
        match e {
            CryoError::Config(c) => Self::Config(c.to_string()),
            CryoError::Io(io) => Self::Io(io),
            CryoError::Smoke(p @ ProbeError::ChecksFailed { .. }) => Self::SmokeFailed(p.to_string()),
            CryoError::Smoke(p) => Self::ServiceUnavailable(p.to_string()),
            CryoError::Setup(s) => Self::Command(s.to_string()),
            CryoError::Service(s) => Self::Command(s.to_string()),
        }
    }
}

impl From<SetupError> for CliError {
    fn from(e: SetupError) -> Self {
        match e {
            // keep the "run this from the project root" hint
            SetupError::WrongDirectory { .. } => Self::Command(e.to_string()),
            other => CryoError::from(other).into(),
        }
    }
}

impl From<LauncherError> for CliError {
    fn from(e: LauncherError) -> Self {
        CryoError::from(e).into()
    }
}

impl From<SmokeError> for CliError {
    fn from(e: SmokeError) -> Self {
        match e {
            SmokeError::InvalidUrl { .. } => Self::Config(e.to_string()),
            other => CryoError::from(other).into(),
        }
    }
}
