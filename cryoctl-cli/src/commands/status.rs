//! `cryoctl status` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{debug, warn};

use cryoctl_core::config::CryoConfig;
use cryoctl_launcher::{InstanceState, ServiceLauncher};
use cryoctl_smoke::{ApiClient, ROOT_PATH, RootInfo};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
///
/// Reports the pid file state and a single root request. Always succeeds:
/// a stopped or unreachable service is a status, not an error.
pub async fn execute(config: &CryoConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let launcher = ServiceLauncher::new(config);

    let instance = launcher.state().unwrap_or_else(|e| {
        warn!(error = %e, "failed to read pid file");
        InstanceState::Stale {
            reason: e.to_string(),
        }
    });

    let endpoint = probe_root(config).await;

    writer.render(&StatusReport {
        service: launcher.config().name.clone(),
        pid_file: launcher.pid_file().path().display().to_string(),
        instance,
        endpoint,
    })?;
    Ok(())
}

async fn probe_root(config: &CryoConfig) -> EndpointStatus {
    let url = config.smoke.base_url.clone();
    let client = match ApiClient::new(&url, config.smoke.request_timeout()) {
        Ok(client) => client,
        Err(e) => return EndpointStatus::unreachable(url, e.to_string()),
    };

    match client.get(ROOT_PATH, &[]).await {
        Ok(reply) => {
            debug!(status = reply.status, "root endpoint answered");
            EndpointStatus {
                url,
                reachable: true,
                http_status: Some(reply.status),
                info: RootInfo::parse(&reply.body),
                error: None,
            }
        }
        Err(e) => EndpointStatus::unreachable(url, e.to_string()),
    }
}

#[derive(Serialize)]
pub struct StatusReport {
    pub service: String,
    pub pid_file: String,
    pub instance: InstanceState,
    pub endpoint: EndpointStatus,
}

#[derive(Serialize)]
pub struct EndpointStatus {
    pub url: String,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<RootInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointStatus {
    fn unreachable(url: String, error: String) -> Self {
        Self {
            url,
            reachable: false,
            http_status: None,
            info: None,
            error: Some(error),
        }
    }
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.instance {
            InstanceState::Running { pid } => writeln!(
                w,
                "Service {}: {} (pid {pid})",
                self.service.bold(),
                "running".green().bold()
            )?,
            InstanceState::Stale { reason } => writeln!(
                w,
                "Service {}: {} ({reason})",
                self.service.bold(),
                "stale pid file".yellow().bold()
            )?,
            InstanceState::NotRunning => writeln!(
                w,
                "Service {}: {}",
                self.service.bold(),
                "not running".red().bold()
            )?,
        }
        writeln!(w, "  pid file: {}", self.pid_file.dimmed())?;

        let ep = &self.endpoint;
        match ep.http_status {
            Some(code) => writeln!(w, "Endpoint {}: {} (HTTP {code})", ep.url, "reachable".green())?,
            None => writeln!(
                w,
                "Endpoint {}: {} ({})",
                ep.url,
                "unreachable".red(),
                ep.error.as_deref().unwrap_or("unknown error")
            )?,
        }

        if let Some(info) = &ep.info {
            if let Some(message) = &info.message {
                writeln!(w, "  message: {message}")?;
            }
            if let Some(version) = &info.version {
                writeln!(w, "  version: {version}")?;
            }
            if let Some(status) = &info.status {
                writeln!(w, "  status:  {status}")?;
            }
        }
        Ok(())
    }
}
