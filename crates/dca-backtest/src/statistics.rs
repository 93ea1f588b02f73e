//! Backtest statistics.

use dca_core::types::Fill;
use dca_metrics::stats;
use dca_rebalance::{ExecutionStatus, RebalanceExecution};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Backtest statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestStats {
    /// Cash deposited over the whole run
    pub invested_capital: Decimal,
    /// Holdings plus cash at the end
    pub final_value: Decimal,
    /// Uninvested cash at the end
    pub final_cash: Decimal,
    /// `(final_value - invested_capital) / invested_capital`, in percent
    pub total_return_pct: Decimal,
    /// Annualized volatility of flow-adjusted daily returns
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Deepest decline of the flow-adjusted value index, in percent (non-negative)
    pub max_drawdown_pct: f64,
    /// Number of contributions made
    pub contributions: usize,
    /// Rebalances that completed with at least one trade
    pub rebalances: usize,
    pub failed_rebalances: usize,
    /// Fills from contributions and rebalances
    pub total_trades: usize,
    pub fees_paid: Decimal,
    /// Number of days simulated
    pub days_processed: usize,
    /// Portfolio value per simulated day
    pub equity_curve: Vec<(i64, Decimal)>,
    /// Daily returns net of deposits
    #[serde(skip)]
    daily_returns: Vec<f64>,
}

impl Default for BacktestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BacktestStats {
    /// Create new stats tracker.
    pub fn new() -> Self {
        Self {
            invested_capital: Decimal::ZERO,
            final_value: Decimal::ZERO,
            final_cash: Decimal::ZERO,
            total_return_pct: Decimal::ZERO,
            annualized_volatility: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            max_drawdown_pct: 0.0,
            contributions: 0,
            rebalances: 0,
            failed_rebalances: 0,
            total_trades: 0,
            fees_paid: Decimal::ZERO,
            days_processed: 0,
            equity_curve: Vec::new(),
            daily_returns: Vec::new(),
        }
    }

    /// Record a cash deposit.
    pub fn record_contribution(&mut self, amount: Decimal) {
        self.invested_capital += amount;
        self.contributions += 1;
    }

    /// Record a fill.
    pub fn record_fill(&mut self, fill: &Fill) {
        self.total_trades += 1;
        self.fees_paid += fill.fee;
    }

    /// Record a rebalance attempt and its fills.
    pub fn record_rebalance(&mut self, execution: &RebalanceExecution) {
        for fill in &execution.fills {
            self.record_fill(fill);
        }
        match execution.status {
            ExecutionStatus::Failed => self.failed_rebalances += 1,
            ExecutionStatus::Executed if !execution.fills.is_empty() => self.rebalances += 1,
            _ => {}
        }
    }

    /// Record end-of-day value. `deposit` is the cash added that day, which is excluded
    /// from the day's return.
    pub fn record_equity(&mut self, timestamp: i64, equity: Decimal, deposit: Decimal) {
        if let Some((_, prev)) = self.equity_curve.last() {
            if *prev > Decimal::ZERO {
                let ret = ((equity - deposit) / *prev - Decimal::ONE)
                    .to_f64()
                    .unwrap_or(0.0);
                self.daily_returns.push(ret);
            }
        }
        self.equity_curve.push((timestamp, equity));
        self.days_processed += 1;
    }

    /// Flow-adjusted daily returns recorded so far.
    pub fn daily_returns(&self) -> &[f64] {
        &self.daily_returns
    }

    /// Calculate final statistics.
    pub fn finalize(
        &mut self,
        final_value: Decimal,
        final_cash: Decimal,
        risk_free_rate: f64,
        periods_per_year: f64,
    ) {
        self.final_value = final_value;
        self.final_cash = final_cash;

        if self.invested_capital > Decimal::ZERO {
            self.total_return_pct =
                (final_value - self.invested_capital) / self.invested_capital * dec!(100);
        }

        let returns = &self.daily_returns;
        self.annualized_volatility = stats::annualized_volatility(returns, periods_per_year);
        self.sharpe_ratio = stats::sharpe_ratio(returns, risk_free_rate, periods_per_year);
        self.sortino_ratio = stats::sortino_ratio(returns, periods_per_year);

        // Unit index so deposits do not read as gains
        let mut index = Vec::with_capacity(returns.len() + 1);
        let mut value = 1.0;
        index.push(value);
        for r in returns {
            value *= 1.0 + r;
            index.push(value);
        }
        self.max_drawdown_pct = -stats::max_drawdown(&index) * 100.0;
    }
}
