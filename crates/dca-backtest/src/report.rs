//! Backtest report generation.

use dca_core::types::TargetAllocation;
use dca_rebalance::RebalanceExecution;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{BacktestConfig, BacktestStats};

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Configuration used
    pub config: BacktestConfig,
    /// Statistics
    pub stats: BacktestStats,
    /// Target built from the warmup window
    pub target: TargetAllocation,
    /// Units held at the end
    pub final_holdings: BTreeMap<String, Decimal>,
    /// Rebalances that traded or failed
    pub executions: Vec<RebalanceExecution>,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                   DCA BACKTEST REPORT                      \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("TARGET ALLOCATION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        for (symbol, weight) in self.target.iter() {
            s.push_str(&format!("  {:<20} {:>6.2}%\n", symbol, weight * 100.0));
        }
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Invested Capital:    ${:.2}\n",
            self.stats.invested_capital
        ));
        s.push_str(&format!(
            "  Final Value:         ${:.2}\n",
            self.stats.final_value
        ));
        s.push_str(&format!(
            "  Uninvested Cash:     ${:.2}\n",
            self.stats.final_cash
        ));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            self.stats.total_return_pct
        ));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            self.stats.max_drawdown_pct
        ));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Volatility (ann.):   {:.2}%\n",
            self.stats.annualized_volatility * 100.0
        ));
        s.push_str(&format!(
            "  Sharpe Ratio:        {:.2}\n",
            self.stats.sharpe_ratio
        ));
        s.push_str(&format!(
            "  Sortino Ratio:       {:.2}\n",
            self.stats.sortino_ratio
        ));
        s.push('\n');

        s.push_str("ACTIVITY\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!(
            "  Days Simulated:      {}\n",
            self.stats.days_processed
        ));
        s.push_str(&format!(
            "  Contributions:       {}\n",
            self.stats.contributions
        ));
        s.push_str(&format!(
            "  Rebalances:          {}\n",
            self.stats.rebalances
        ));
        s.push_str(&format!(
            "  Failed Rebalances:   {}\n",
            self.stats.failed_rebalances
        ));
        s.push_str(&format!(
            "  Total Trades:        {}\n",
            self.stats.total_trades
        ));
        s.push_str(&format!(
            "  Fees Paid:           ${:.2}\n",
            self.stats.fees_paid
        ));
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV (equity curve only).
    pub fn equity_to_csv(&self) -> String {
        let mut csv = String::from("timestamp,equity\n");
        for (ts, equity) in &self.stats.equity_curve {
            csv.push_str(&format!("{},{}\n", ts, equity));
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_report() -> BacktestReport {
        let mut stats = BacktestStats::new();
        stats.invested_capital = dec!(2000);
        stats.final_value = dec!(2200);
        stats.total_return_pct = dec!(10);
        stats.max_drawdown_pct = 5.0;
        stats.rebalances = 3;
        stats.equity_curve = vec![(0, dec!(1000)), (86_400_000, dec!(2200))];

        BacktestReport {
            config: BacktestConfig::default(),
            stats,
            target: [("BTC".to_string(), 0.6), ("ETH".to_string(), 0.4)]
                .into_iter()
                .collect(),
            final_holdings: BTreeMap::new(),
            executions: Vec::new(),
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = create_report().summary();
        assert!(summary.contains("Total Return"));
        assert!(summary.contains("10.00%"));
        assert!(summary.contains("60.00%"));
        assert!(summary.contains("Rebalances:          3"));
    }

    #[test]
    fn test_report_exports() {
        let report = create_report();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"invested_capital\""));
        assert_eq!(
            report.equity_to_csv(),
            "timestamp,equity\n0,1000\n86400000,2200\n"
        );
    }
}
