//! Backtest command implementation.

use anyhow::{Context, Result};
use dca_backtest::{BacktestConfig, DcaSimulator};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::info;

use super::{load_app_config, load_universe};
use crate::cli::BacktestArgs;

pub async fn run(args: BacktestArgs, config_path: &Path) -> Result<()> {
    let mut config = load_app_config(config_path)?;
    if let Some(preset) = &args.preset {
        config.optimization.preset = preset.clone();
    }
    info!("Starting backtest with preset: {}", config.optimization.preset);

    let settings = &config.backtest;
    let mut backtest_config = BacktestConfig {
        initial_capital: settings.initial_capital,
        contribution_amount: settings.contribution_amount,
        contribution_interval_days: settings.contribution_interval_days,
        fee_bps: settings.fee_bps,
        warmup_days: settings.warmup_days,
        optimization: config.optimization.to_optimization_config()?,
        rebalance: config.rebalance.monitor_config(),
        planner: config.rebalance.planner_config(),
    };
    if let Some(capital) = args.capital {
        backtest_config.initial_capital = Decimal::try_from(capital).context("Invalid capital")?;
    }
    if let Some(amount) = args.contribution {
        backtest_config.contribution_amount =
            Decimal::try_from(amount).context("Invalid contribution amount")?;
    }
    if let Some(days) = args.interval_days {
        backtest_config.contribution_interval_days = days;
    }
    if let Some(fee) = args.fee_bps {
        backtest_config.fee_bps = Decimal::try_from(fee).context("Invalid fee")?;
    }

    let simulator = DcaSimulator::new(backtest_config)?;

    // The simulation needs the full history, not the optimization lookback
    let data = load_universe(&config.data, &args.symbols, false).await?;

    let report = simulator
        .run(&data.histories, &data.metadata)
        .await
        .context("Backtest failed")?;

    // Output results
    match args.output.as_str() {
        "json" => {
            let json = report.to_json()?;
            println!("{}", json);
        }
        _ => {
            println!("{}", report.summary());
        }
    }

    // Save if requested
    if let Some(save_path) = &args.save {
        let json = report.to_json()?;
        std::fs::write(save_path, json)?;
        info!("Results saved to {:?}", save_path);
    }
    if let Some(csv_path) = &args.equity_csv {
        std::fs::write(csv_path, report.equity_to_csv())?;
        info!("Equity curve saved to {:?}", csv_path);
    }

    Ok(())
}
