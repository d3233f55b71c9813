//! Command handlers -- one module per subcommand

pub mod config;
pub mod launch;
pub mod setup;
pub mod smoke;
pub mod status;
pub mod stop;

use std::path::{Path, PathBuf};

use cryoctl_core::config::{CryoConfig, DEFAULT_CONFIG_FILE};

use crate::error::CliError;

/// Where the effective configuration came from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Explicit `--config` path; it must exist.
    Explicit(PathBuf),
    /// `./cryoctl.toml`, used only if present.
    Default(PathBuf),
}

impl ConfigSource {
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) => Self::Explicit(path.to_path_buf()),
            None => Self::Default(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(p) | Self::Default(p) => p,
        }
    }

    /// Label used in command output.
    pub fn describe(&self) -> String {
        match self {
            Self::Default(p) if !p.exists() => "(built-in defaults)".to_owned(),
            other => other.path().display().to_string(),
        }
    }

    /// Load, apply `CRYOCTL_*` overrides and validate.
    pub async fn load(&self) -> Result<CryoConfig, CliError> {
        let config = match self {
            Self::Explicit(path) => CryoConfig::load(path).await?,
            Self::Default(path) => CryoConfig::load_or_default(path).await?,
        };
        Ok(config)
    }
}
