//! Optimize command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use dca_core::types::PortfolioState;
use dca_portfolio::{ContributionPlan, PortfolioOptimizer};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::{load_app_config, load_universe, open_store};
use crate::cli::OptimizeArgs;

pub async fn run(args: OptimizeArgs, config_path: &Path) -> Result<()> {
    let mut config = load_app_config(config_path)?;
    if let Some(preset) = &args.preset {
        config.optimization.preset = preset.clone();
    }
    info!("Optimizing with preset: {}", config.optimization.preset);

    let optimization = config.optimization.to_optimization_config()?;
    let optimizer = PortfolioOptimizer::new(optimization)?;

    let data = load_universe(&config.data, &args.symbols, true).await?;
    let outcome = optimizer
        .optimize(&data.histories, &data.metadata)
        .context("Optimization failed")?;
    let stats = optimizer.stats(&outcome.target, &data.histories);

    let contribution = match args.contribution {
        Some(amount) => {
            let amount = Decimal::try_from(amount).context("Invalid contribution amount")?;
            Some(ContributionPlan::new(amount, &outcome.target)?)
        }
        None => None,
    };

    match args.output.as_str() {
        "json" => {
            let failures: BTreeMap<&str, String> = data
                .failures
                .iter()
                .map(|(symbol, err)| (symbol.as_str(), err.to_string()))
                .collect();
            let body = json!({
                "preset": config.optimization.preset,
                "outcome": outcome,
                "stats": stats,
                "contribution": contribution,
                "failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            println!("Asset Ranking ({})", config.optimization.preset);
            println!("═══════════════════════════════════════════════════════════");
            println!(
                "  {:<4} {:<10} {:>8} {:>8} {:>8} {:>9} {:>8}",
                "", "Symbol", "Score", "Sharpe", "Vol", "Momentum", "Return"
            );
            for asset in &outcome.ranked {
                let selected = if outcome.target.contains(&asset.symbol) { "*" } else { "" };
                let metrics = outcome.metrics.get(&asset.symbol);
                println!(
                    "  {:<4} {:<10} {:>8.3} {:>8.2} {:>7.1}% {:>8.1}% {:>7.1}%",
                    selected,
                    asset.symbol,
                    asset.composite_score,
                    metrics.map(|m| m.sharpe_ratio).unwrap_or(0.0),
                    metrics.map(|m| m.annualized_volatility * 100.0).unwrap_or(0.0),
                    metrics.map(|m| m.momentum * 100.0).unwrap_or(0.0),
                    metrics.map(|m| m.total_return * 100.0).unwrap_or(0.0),
                );
            }
            if !outcome.excluded.is_empty() {
                println!("  Excluded: {}", outcome.excluded.join(", "));
            }
            for (symbol, err) in &data.failures {
                println!("  Skipped {}: {}", symbol, err);
            }
            println!();

            println!("Target Allocation");
            println!("───────────────────────────────────────────────────────────");
            for (symbol, weight) in outcome.target.iter() {
                println!("  {:<10} {:>6.1}%", symbol, weight * 100.0);
            }
            println!(
                "  Average pairwise correlation: {:.2}",
                outcome.average_correlation
            );
            println!();

            println!("Historical Statistics");
            println!("───────────────────────────────────────────────────────────");
            println!("  Volatility (ann.):   {:.2}%", stats.annualized_volatility * 100.0);
            println!("  Sharpe Ratio:        {:.2}", stats.sharpe_ratio);
            println!("  Sortino Ratio:       {:.2}", stats.sortino_ratio);
            println!("  Max Drawdown:        {:.2}%", stats.max_drawdown * 100.0);
            println!("  Total Return:        {:.2}%", stats.total_return * 100.0);

            if let Some(plan) = &contribution {
                println!();
                println!("Contribution of ${:.2}", plan.amount);
                println!("───────────────────────────────────────────────────────────");
                for (symbol, amount) in &plan.allocations {
                    println!("  {:<10} ${:.2}", symbol, amount);
                }
            }
        }
    }

    if args.save {
        let store = open_store(&config.data);
        let portfolio_id = &config.data.portfolio_id;
        let state = match store.load_state(portfolio_id) {
            Ok(mut existing) => {
                existing.target = outcome.target.clone();
                existing
            }
            Err(_) => PortfolioState::new(portfolio_id.clone(), outcome.target.clone(), Utc::now()),
        };
        store.save_state(&state)?;
        info!("Target saved for portfolio '{}'", portfolio_id);
    }

    Ok(())
}
