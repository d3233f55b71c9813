//! `cryoctl launch` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use cryoctl_core::config::CryoConfig;
use cryoctl_launcher::{LaunchMode, LaunchOutcome, ServiceLauncher, StopOutcome};
use cryoctl_smoke::{ApiClient, Readiness, wait_ready};

use crate::cli::LaunchArgs;
use crate::commands::stop::StopReport;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, mark};

/// Execute the `launch` command.
///
/// In foreground mode this returns only after the service exits.
pub async fn execute(
    args: LaunchArgs,
    config: &CryoConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut launcher = ServiceLauncher::new(config);
    if args.no_pattern {
        launcher = launcher.pattern_fallback(false);
    }

    let mode = if args.detach {
        LaunchMode::Detached
    } else {
        LaunchMode::Foreground
    };

    let stopped = launcher.stop_existing().await?;
    writer.note(StopReport::lines(&stopped))?;

    if mode == LaunchMode::Foreground {
        writer.note(format!(
            "{} Starting {} (Ctrl-C to stop)",
            mark::INFO,
            launcher.config().name
        ))?;
    }

    let outcome = launcher.start(mode, &stopped).await?;

    let ready = if args.wait_ready {
        Some(probe_readiness(config).await)
    } else {
        None
    };

    let report = LaunchReport {
        service: launcher.config().name.clone(),
        stopped,
        outcome,
        ready,
    };
    writer.render(&report)?;

    match (&report.outcome, report.ready) {
        (_, Some(false)) => Err(CliError::ServiceUnavailable(format!(
            "{} did not answer at {}",
            report.service, config.smoke.base_url
        ))),
        (LaunchOutcome::Exited { code, .. }, _) if *code != Some(0) => {
            Err(CliError::Command(match code {
                Some(code) => format!("{} exited with status {code}", report.service),
                None => format!("{} was terminated by a signal", report.service),
            }))
        }
        _ => Ok(()),
    }
}

async fn probe_readiness(config: &CryoConfig) -> bool {
    let client = match ApiClient::new(&config.smoke.base_url, config.smoke.request_timeout()) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "cannot build readiness client");
            return false;
        }
    };
    let readiness = Readiness {
        path: config.smoke.readiness_path.clone(),
        attempts: config.smoke.readiness_attempts.max(1),
        interval: config.smoke.readiness_interval(),
    };
    info!(base_url = %config.smoke.base_url, "waiting for service readiness");
    wait_ready(&client, &readiness).await.is_ok()
}

#[derive(Serialize)]
pub struct LaunchReport {
    pub service: String,
    pub stopped: StopOutcome,
    pub outcome: LaunchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
}

impl Render for LaunchReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.outcome {
            LaunchOutcome::Exited { pid, code } => {
                let status = match code {
                    Some(code) => format!("status {code}"),
                    None => "signal".to_owned(),
                };
                writeln!(w, "{} {} (pid {pid}) exited with {status}", mark::INFO, self.service)?;
            }
            LaunchOutcome::Detached { pid, log_file } => {
                writeln!(
                    w,
                    "{} {} started in background (pid {})",
                    mark::OK,
                    self.service,
                    pid.to_string().bold()
                )?;
                if let Some(log) = log_file {
                    writeln!(w, "   logs: {}", log.display())?;
                }
            }
        }

        match self.ready {
            Some(true) => writeln!(w, "{} Service is ready", mark::OK)?,
            Some(false) => writeln!(w, "{} {}", mark::FAIL, "Service did not become ready".red())?,
            None => {}
        }
        Ok(())
    }
}
