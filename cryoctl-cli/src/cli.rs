//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use cryoctl_core::types::GateType;

/// cryoctl -- development environment setup, service launcher and smoke test
/// for the quantum API.
///
/// Use `cryoctl <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "cryoctl", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: ./cryoctl.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the Python environment and install dependencies.
    Setup(SetupArgs),

    /// Stop any previous instance and start the service.
    Launch(LaunchArgs),

    /// Stop the running service instance.
    Stop,

    /// Show whether the service is running and reachable.
    Status,

    /// Probe the running service endpoints.
    Smoke(SmokeArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- setup ----

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Print the steps without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// Run every step even after a failure (exit status still reports it).
    #[arg(short = 'k', long)]
    pub keep_going: bool,
}

// ---- launch ----

#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Run the service in the background (default: foreground).
    #[arg(short = 'd', long)]
    pub detach: bool,

    /// Wait until the service answers HTTP requests (background mode only).
    #[arg(long, requires = "detach")]
    pub wait_ready: bool,

    /// Only use the pid file to find a previous instance.
    #[arg(long)]
    pub no_pattern: bool,
}

// ---- smoke ----

#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Gate used for the entanglement request (CNOT, CZ).
    #[arg(short, long)]
    pub gate_type: Option<GateType>,

    /// Service base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Exit successfully even when checks fail.
    #[arg(long)]
    pub allow_failures: bool,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, setup, service, smoke).
        #[arg(long)]
        section: Option<String>,
    },
}
