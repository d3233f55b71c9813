//! `cryoctl smoke` command handler

use std::io::Write;

use serde::Serialize;

use cryoctl_core::config::CryoConfig;
use cryoctl_smoke::{SmokeReport, SmokeTest};

use crate::cli::SmokeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, mark};

/// Execute the `smoke` command.
///
/// Exits with code 4 when any check failed unless `--allow-failures`.
pub async fn execute(
    args: SmokeArgs,
    config: &CryoConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut smoke_config = config.smoke.clone();
    if let Some(base_url) = args.base_url {
        smoke_config.base_url = base_url;
    }
    if let Some(gate_type) = args.gate_type {
        smoke_config.gate_type = gate_type;
    }

    writer.note(format!(
        "{} Testing {} (gate {})",
        mark::INFO,
        smoke_config.base_url,
        smoke_config.gate_type
    ))?;

    let smoke = SmokeTest::from_config(&smoke_config)?;
    let report = smoke.run().await;

    writer.render(&SmokeSummary(&report))?;

    if args.allow_failures {
        return Ok(());
    }
    report.into_result()?;
    Ok(())
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct SmokeSummary<'a>(pub &'a SmokeReport);

impl Render for SmokeSummary<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let report = self.0;
        for check in &report.checks {
            let prefix = if check.passed { mark::OK } else { mark::FAIL };
            writeln!(w, "{prefix} {}", check.summary)?;
        }

        writeln!(w)?;
        if report.passed() {
            writeln!(w, "{}", "Smoke test passed".green().bold())?;
        } else {
            writeln!(
                w,
                "{}",
                format!(
                    "Smoke test failed: {} of {} checks",
                    report.failed_count(),
                    report.checks.len()
                )
                .red()
                .bold()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryoctl_core::types::GateType;
    use cryoctl_smoke::CheckResult;

    fn check(name: &str, passed: bool, summary: &str) -> CheckResult {
        CheckResult {
            name: name.to_owned(),
            passed,
            summary: summary.to_owned(),
            detail: None,
        }
    }

    fn render(report: &SmokeReport) -> String {
        let mut buffer = Vec::new();
        SmokeSummary(report).render_text(&mut buffer).expect("render");
        String::from_utf8(buffer).expect("utf-8")
    }

    #[test]
    fn test_concurrence_line_is_printed() {
        let report = SmokeReport {
            base_url: "http://localhost:8000/".to_owned(),
            gate_type: GateType::Cnot,
            checks: vec![
                check("root", true, "Root endpoint reachable (HTTP 200)"),
                check("entanglement", true, "Entanglement working! Concurrence: 0.87"),
            ],
        };
        let output = render(&report);
        assert!(output.contains("✅ Entanglement working! Concurrence: 0.87"));
        assert!(output.contains("Smoke test passed"));
    }

    #[test]
    fn test_failure_line_carries_message() {
        let report = SmokeReport {
            base_url: "http://localhost:8000/".to_owned(),
            gate_type: GateType::Cnot,
            checks: vec![
                check("root", true, "Root endpoint reachable (HTTP 200)"),
                check("entanglement", false, "Entanglement failed: invalid gate"),
            ],
        };
        let output = render(&report);
        assert!(output.contains("❌ Entanglement failed: invalid gate"));
        assert!(output.contains("1 of 2 checks"));
    }

    #[test]
    fn test_json_output_keeps_checks() {
        let report = SmokeReport {
            base_url: "http://localhost:8000/".to_owned(),
            gate_type: GateType::Cz,
            checks: vec![check("root", true, "Root endpoint reachable (HTTP 200)")],
        };
        let json = serde_json::to_value(SmokeSummary(&report)).expect("serialize");
        assert_eq!(json["gate_type"], "CZ");
        assert_eq!(json["checks"][0]["name"], "root");
        assert_eq!(json["checks"][0]["passed"], true);
    }
}
