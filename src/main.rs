//! DCA portfolio engine CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use dca_config::load_config;
use dca_monitor::{setup_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes up before the config is validated, so fall back to defaults here
    let logging = load_config(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    let level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or(logging.level);
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        logging.format.parse().unwrap_or_default()
    };
    let _guard = setup_logging(&level, format, logging.file.as_deref().map(std::path::Path::new));

    // Execute command
    match cli.command {
        Commands::Optimize(args) => cli::commands::optimize::run(args, &cli.config).await,
        Commands::Check(args) => cli::commands::check::run(args, &cli.config).await,
        Commands::Plan(args) => cli::commands::plan::run(args, &cli.config).await,
        Commands::Backtest(args) => cli::commands::backtest::run(args, &cli.config).await,
        Commands::Presets => cli::commands::presets::run().await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
