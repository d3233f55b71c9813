//! `cryoctl setup` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use cryoctl_core::config::CryoConfig;
use cryoctl_core::types::FailurePolicy;
use cryoctl_env_setup::{EnvironmentSetup, SetupPlan, SetupReport, StepStatus};

use crate::cli::SetupArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, mark};

/// Execute the `setup` command.
///
/// Fails with exit code 1 before running anything when the sentinel file is
/// missing, and after the run when any step failed.
pub async fn execute(
    args: SetupArgs,
    config: &CryoConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut setup = EnvironmentSetup::new(&config.setup, &config.project_root());
    if args.keep_going {
        setup = setup.policy(FailurePolicy::Continue);
    }

    setup.plan().check_precondition()?;

    if args.dry_run {
        info!("dry run, no step will be executed");
        writer.render(&PlanReport::from(setup.plan()))?;
        return Ok(());
    }

    writer.note(format!(
        "{} Setting up environment in {}",
        mark::INFO,
        setup.plan().env_dir().display()
    ))?;

    let report = setup.run().await?;
    writer.render(&SetupSummary(&report))?;
    report.into_result()?;
    Ok(())
}

/// `--dry-run` output: the steps that would run.
#[derive(Serialize)]
pub struct PlanReport {
    pub root: String,
    pub env_dir: String,
    pub steps: Vec<PlannedStep>,
}

#[derive(Serialize)]
pub struct PlannedStep {
    pub name: String,
    pub command: String,
}

impl From<&SetupPlan> for PlanReport {
    fn from(plan: &SetupPlan) -> Self {
        Self {
            root: plan.root().display().to_string(),
            env_dir: plan.env_dir().display().to_string(),
            steps: plan
                .steps()
                .iter()
                .map(|s| PlannedStep {
                    name: s.name(),
                    command: s.command_line(),
                })
                .collect(),
        }
    }
}

impl Render for PlanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Setup plan for {}", self.root.bold())?;
        for (idx, step) in self.steps.iter().enumerate() {
            writeln!(w, "  {}. {:<28} {}", idx + 1, step.name, step.command.dimmed())?;
        }
        Ok(())
    }
}

/// Borrowing wrapper so the library report renders without cloning.
#[derive(Serialize)]
#[serde(transparent)]
pub struct SetupSummary<'a>(pub &'a SetupReport);

impl Render for SetupSummary<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let report = self.0;
        for step in &report.steps {
            match &step.status {
                StepStatus::Succeeded => writeln!(w, "{} {}", mark::OK, step.name)?,
                StepStatus::Failed(reason) => {
                    writeln!(w, "{} {}: {}", mark::FAIL, step.name, reason.red())?
                }
                StepStatus::Skipped => {
                    writeln!(w, "{} {} {}", mark::SKIP, step.name, "(skipped)".dimmed())?
                }
            }
        }

        writeln!(w)?;
        if report.succeeded() {
            writeln!(w, "{}", "Setup complete!".green().bold())?;
            writeln!(
                w,
                "Activate the environment with: source {}/bin/activate",
                report.env_dir.display()
            )?;
        } else {
            let failed = report.failed_steps().count();
            writeln!(
                w,
                "{}",
                format!("Setup finished with {failed} failed step(s)").red().bold()
            )?;
        }
        Ok(())
    }
}
