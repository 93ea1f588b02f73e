//! Plan command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dca_config::AppConfig;
use dca_core::traits::HistorySource;
use dca_core::types::{PortfolioSnapshot, TargetAllocation};
use dca_data::CsvHistorySource;
use dca_rebalance::{
    execute_plan, ExecutionStatus, PaperExecutor, RebalanceMonitor, RebalancePlan, TradePlanner,
};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use super::{load_app_config, load_portfolio, open_store};
use crate::cli::PlanArgs;

const EXECUTIONS: &str = "executions";

pub async fn run(args: PlanArgs, config_path: &Path) -> Result<()> {
    let config = load_app_config(config_path)?;
    let portfolio_id = args
        .portfolio
        .unwrap_or_else(|| config.data.portfolio_id.clone());

    let now = Utc::now();
    let (mut state, snapshot) = load_portfolio(&config, &portfolio_id, now).await?;

    let monitor = RebalanceMonitor::new(config.rebalance.monitor_config());
    let decision = monitor.evaluate(&state.target, &snapshot, state.rebalance_anchor(), now);

    if !decision.is_approved() {
        println!("No rebalance: {} ({})", decision.state, decision.reason);
        return Ok(());
    }

    let planner = TradePlanner::new(config.rebalance.planner_config());
    let actions = planner.plan(&decision, &snapshot, &state.target)?;
    let plan = RebalancePlan::new(portfolio_id.clone(), &decision, actions, now);

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&plan)?),
        _ => {
            println!("Rebalance Plan: {}", portfolio_id);
            println!("═══════════════════════════════════════════════════════════");
            println!("  Reason: {}", plan.reason);
            println!();
            println!(
                "  {:<4} {:<10} {:>12} {:>8} {:>8} {:>8}",
                "Pri", "Symbol", "Notional", "Side", "Current", "Target"
            );
            for action in &plan.actions {
                println!(
                    "  {:<4} {:<10} {:>12.2} {:>8} {:>7.1}% {:>7.1}%",
                    action.priority,
                    action.symbol,
                    action.notional,
                    action.side.to_string(),
                    action.current_weight * 100.0,
                    action.target_weight * 100.0
                );
            }
            println!();
            println!(
                "  Executable notional: ${:.2} ({} deferred)",
                plan.executable_notional(),
                plan.deferred().len()
            );
        }
    }

    if !args.execute {
        return Ok(());
    }

    let prices = execution_prices(&config, &snapshot, &state.target).await;
    let holdings: BTreeMap<String, Decimal> = snapshot
        .positions
        .iter()
        .map(|(symbol, position)| (symbol.clone(), position.amount))
        .collect();
    let mut executor = PaperExecutor::new(snapshot.cash_balance)
        .with_holdings(holdings)
        .with_fee_bps(config.backtest.fee_bps);
    executor.set_prices(prices, now);

    let execution = execute_plan(&mut executor, plan, &mut state, now).await;

    let store = open_store(&config.data);
    store
        .save_record(EXECUTIONS, &execution.id.to_string(), &execution)
        .context("Failed to record execution")?;

    match execution.status {
        ExecutionStatus::Executed => {
            store.save_state(&state)?;
            store.save_snapshot(&portfolio_id, &executor.snapshot()?)?;
            println!(
                "Executed {} trade(s), fees ${:.2}",
                execution.fills.len(),
                execution.total_fees()
            );
        }
        _ => {
            println!("Execution {}: {}", execution.status, execution.notes.join("; "));
        }
    }
    for note in &execution.notes {
        info!(id = %execution.id, "{}", note);
    }

    Ok(())
}

/// Prices to execute at: implied by the snapshot for held symbols, latest close for the rest.
async fn execution_prices(
    config: &AppConfig,
    snapshot: &PortfolioSnapshot,
    target: &TargetAllocation,
) -> BTreeMap<String, Decimal> {
    let mut prices: BTreeMap<String, Decimal> = snapshot
        .positions
        .iter()
        .filter(|(_, p)| p.amount > Decimal::ZERO)
        .map(|(symbol, p)| (symbol.clone(), p.value / p.amount))
        .collect();

    let missing: Vec<&str> = target
        .symbols()
        .into_iter()
        .filter(|s| !prices.contains_key(*s))
        .collect();
    if missing.is_empty() {
        return prices;
    }

    let source = match CsvHistorySource::new(&config.data.dir) {
        Ok(source) => source,
        Err(err) => {
            warn!(error = %err, "no price source for unheld symbols");
            return prices;
        }
    };
    for symbol in missing {
        let close = source
            .load_history(symbol, None)
            .await
            .ok()
            .and_then(|series| series.last().map(|p| (p.timestamp, p.close)));
        match close.and_then(|(ts, close)| Some((ts, Decimal::from_f64(close)?))) {
            Some((ts, price)) => {
                let as_of = DateTime::<Utc>::from_timestamp_millis(ts);
                info!(symbol, price = %price, as_of = ?as_of, "using latest close");
                prices.insert(symbol.to_string(), price);
            }
            None => warn!(symbol, "no price available"),
        }
    }
    prices
}
