//! `cryoctl config` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use cryoctl_core::config::CryoConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::ConfigSource;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Section names accepted by `config show --section`.
pub const SECTIONS: [&str; 4] = ["general", "setup", "service", "smoke"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    source: &ConfigSource,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(source, writer).await,
        ConfigAction::Show { section } => execute_show(source, section, writer).await,
    }
}

/// Load and validate the configuration, reporting any error.
///
/// # Errors
///
/// Returns `CliError::Config` when the configuration is invalid.
async fn execute_validate(source: &ConfigSource, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %source.path().display(), "validating configuration");

    let report = match source.load().await {
        Ok(_) => ConfigValidationReport {
            source: source.describe(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: source.describe(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Display the effective configuration (file + env overrides + defaults).
async fn execute_show(
    source: &ConfigSource,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = source.load().await?;
    writer.render(&ConfigReport::new(source.describe(), &config, section)?)?;
    Ok(())
}

/// Configuration display report.
///
/// JSON output carries the selected configuration as `config`; text output
/// prints the same values as TOML.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl ConfigReport {
    /// Snapshot the whole configuration or one section.
    ///
    /// # Errors
    ///
    /// `CliError::Command` for an unknown section name.
    pub fn new(
        source: String,
        config: &CryoConfig,
        section: Option<String>,
    ) -> Result<Self, CliError> {
        let (config_toml, values) = match section.as_deref() {
            None => snapshot(config)?,
            Some("general") => snapshot(&config.general)?,
            Some("setup") => snapshot(&config.setup)?,
            Some("service") => snapshot(&config.service)?,
            Some("smoke") => snapshot(&config.smoke)?,
            Some(other) => {
                return Err(CliError::Command(format!(
                    "unknown section: {other} (expected: {})",
                    SECTIONS.join(", ")
                )));
            }
        };
        Ok(Self {
            source,
            section,
            config: values,
            config_toml,
        })
    }
}

fn snapshot<T: Serialize>(value: &T) -> Result<(String, serde_json::Value), CliError> {
    let toml = toml::to_string_pretty(value)
        .unwrap_or_else(|e| format!("(serialization error: {e})"));
    Ok((toml, serde_json::to_value(value)?))
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
