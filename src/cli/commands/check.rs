//! Check command implementation.

use anyhow::Result;
use chrono::Utc;
use dca_core::types::RebalanceState;
use dca_rebalance::RebalanceMonitor;
use std::path::Path;

use super::{load_app_config, load_portfolio};
use crate::cli::CheckArgs;

pub async fn run(args: CheckArgs, config_path: &Path) -> Result<()> {
    let config = load_app_config(config_path)?;
    let portfolio_id = args
        .portfolio
        .unwrap_or_else(|| config.data.portfolio_id.clone());

    let now = Utc::now();
    let (state, snapshot) = load_portfolio(&config, &portfolio_id, now).await?;

    let monitor = RebalanceMonitor::new(config.rebalance.monitor_config());
    let decision = monitor.evaluate(&state.target, &snapshot, state.rebalance_anchor(), now);

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&decision)?),
        _ => {
            println!("Portfolio: {}", portfolio_id);
            println!("═══════════════════════════════════════════════════════════");
            println!("  Value:               ${:.2}", snapshot.total_value);
            println!("  State:               {}", decision.state);
            println!("  Reason:              {}", decision.reason);
            println!("  Total deviation:     {:.3}", decision.total_deviation);
            println!("  Max deviation:       {:.3}", decision.max_deviation);
            println!(
                "  Days since anchor:   {}",
                decision.elapsed_seconds / 86_400
            );
            println!();
            println!(
                "  {:<10} {:>8} {:>8} {:>9}",
                "Symbol", "Current", "Target", "Deviation"
            );
            for (symbol, deviation) in &decision.per_asset_deviation {
                println!(
                    "  {:<10} {:>7.1}% {:>7.1}% {:>8.1}%",
                    symbol,
                    snapshot.weight(symbol) * 100.0,
                    state.target.weight(symbol) * 100.0,
                    deviation * 100.0
                );
            }
            if decision.state == RebalanceState::NeedsRebalance {
                println!();
                println!("Run `dca plan` to see the trades.");
            }
        }
    }

    Ok(())
}
