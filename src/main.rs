//! Investment advisor CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use advisor_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli::load(&cli.config)?;

    let log_level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json_logs = cli.json_logs || config.logging.format == "json";
    let _log_guard = setup_logging(&log_level, json_logs, config.logging.file.as_deref());

    match cli.command {
        Commands::InitPortfolio(args) => cli::commands::init_portfolio::run(args, config).await,
        Commands::Propose(args) => cli::commands::propose::run(args, config).await,
        Commands::Resume(args) => cli::commands::resume::run(args, config).await,
        Commands::Status(args) => cli::commands::status::run(args, config).await,
        Commands::Ask(args) => cli::commands::ask::run(args, config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config, &config),
    }
}
