//! `cryoctl stop` command handler

use std::io::Write;

use serde::Serialize;

use cryoctl_core::config::CryoConfig;
use cryoctl_launcher::{PidSource, ServiceLauncher, StopOutcome};

use crate::error::CliError;
use crate::output::{OutputWriter, Render, mark};

/// Execute the `stop` command. Nothing running is not an error.
pub async fn execute(config: &CryoConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let launcher = ServiceLauncher::new(config);
    let stopped = launcher.stop_existing().await?;

    writer.render(&StopReport {
        service: launcher.config().name.clone(),
        outcome: stopped,
    })?;
    Ok(())
}

#[derive(Serialize)]
pub struct StopReport {
    pub service: String,
    #[serde(flatten)]
    pub outcome: StopOutcome,
}

impl StopReport {
    /// Text lines describing a stop outcome.
    pub fn lines(outcome: &StopOutcome) -> String {
        let mut lines = Vec::new();
        if outcome.stale_pid_file {
            lines.push(format!("{} Removed stale pid file", mark::WARN));
        }
        for t in &outcome.terminated {
            let via = match t.source {
                PidSource::PidFile => "pid file",
                PidSource::Pattern => "command line match",
            };
            let how = if t.forced { " (killed)" } else { "" };
            lines.push(format!(
                "{} Stopped previous instance pid {} via {via}{how}",
                mark::OK,
                t.pid
            ));
        }
        if outcome.is_noop() {
            lines.push(format!("{} No previous instance running", mark::INFO));
        }
        lines.join("\n")
    }
}

impl Render for StopReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", Self::lines(&self.outcome))
    }
}
