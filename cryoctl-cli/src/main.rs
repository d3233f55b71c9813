use clap::Parser;
use colored::Colorize;

use cryoctl_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = cryoctl_cli::run(cli).await {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(err.exit_code());
    }
}
