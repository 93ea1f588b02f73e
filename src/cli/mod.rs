//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dca")]
#[command(author, version, about = "Portfolio construction and rebalancing for recurring crypto investment")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "DCA_CONFIG")]
    pub config: PathBuf,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a target allocation from price history
    Optimize(OptimizeArgs),
    /// Check whether the portfolio needs rebalancing
    Check(CheckArgs),
    /// Plan (and optionally paper-execute) rebalance trades
    Plan(PlanArgs),
    /// Simulate recurring investment over history
    Backtest(BacktestArgs),
    /// List optimization presets
    Presets,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct OptimizeArgs {
    /// Preset to use instead of the configured one
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Symbols to consider (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Split a contribution of this amount across the target
    #[arg(long)]
    pub contribution: Option<f64>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,

    /// Store the target as the portfolio's state
    #[arg(long)]
    pub save: bool,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Portfolio to check instead of the configured one
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Portfolio to plan for instead of the configured one
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Apply the plan with the paper executor and record the result
    #[arg(long)]
    pub execute: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    /// Preset to use instead of the configured one
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Symbols to consider (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<f64>,

    /// Amount invested every interval
    #[arg(long)]
    pub contribution: Option<f64>,

    /// Days between contributions
    #[arg(long)]
    pub interval_days: Option<i64>,

    /// Fee in basis points
    #[arg(long)]
    pub fee_bps: Option<f64>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,

    /// Save results to file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Save the equity curve as CSV
    #[arg(long)]
    pub equity_csv: Option<PathBuf>,
}
