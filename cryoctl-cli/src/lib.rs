//! cryoctl command-line front end.
//!
//! The binary in `main.rs` parses arguments, calls [`run`] and maps the
//! resulting [`CliError`](error::CliError) to an exit code.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

use cli::{Cli, Commands};
use commands::ConfigSource;
use error::CliError;
use output::OutputWriter;

/// Run one parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let source = ConfigSource::from_arg(cli.config.as_deref());
    let writer = OutputWriter::new(cli.output);

    // `config validate` reports a broken file itself, so the load error is
    // held until the command needs the configuration.
    let loaded = source.load().await;
    let general = loaded
        .as_ref()
        .map(|c| c.general.clone())
        .unwrap_or_default();
    logging::init_tracing(&general, cli.log_level.as_deref())
        .map_err(|e| CliError::Config(e.to_string()))?;

    tracing::debug!(config = %source.describe(), "cryoctl starting");

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &source, &writer).await,
        Commands::Setup(args) => commands::setup::execute(args, &loaded?, &writer).await,
        Commands::Launch(args) => commands::launch::execute(args, &loaded?, &writer).await,
        Commands::Stop => commands::stop::execute(&loaded?, &writer).await,
        Commands::Status => commands::status::execute(&loaded?, &writer).await,
        Commands::Smoke(args) => commands::smoke::execute(args, &loaded?, &writer).await,
    }
}
