//! DCA backtesting engine.

use chrono::{DateTime, Duration, Utc};
use dca_core::error::{ConfigError, DataError, DcaResult};
use dca_core::traits::TradeExecutor;
use dca_core::types::{
    MarketMetadata, PortfolioState, PriceSeries, Side, TargetAllocation, TradeAction,
};
use dca_portfolio::{ContributionPlan, OptimizationConfig, PortfolioOptimizer};
use dca_rebalance::{
    execute_plan, ExecutionStatus, PaperExecutor, PlannerConfig, RebalanceConfig,
    RebalanceMonitor, RebalancePlan, TradePlanner,
};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::report::BacktestReport;
use crate::statistics::BacktestStats;

const BACKTEST_PORTFOLIO: &str = "backtest";

/// Backtest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Cash invested on the first simulated day
    pub initial_capital: Decimal,
    /// Cash invested on the first day and every interval after
    pub contribution_amount: Decimal,
    pub contribution_interval_days: i64,
    /// Fee in basis points of notional
    pub fee_bps: Decimal,
    /// History before the first simulated day used to build the target
    pub warmup_days: i64,
    pub optimization: OptimizationConfig,
    pub rebalance: RebalanceConfig,
    pub planner: PlannerConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(1000),
            contribution_amount: dec!(100),
            contribution_interval_days: 7,
            fee_bps: dec!(10),
            warmup_days: 90,
            optimization: OptimizationConfig::default(),
            rebalance: RebalanceConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

/// Replays daily history: builds a target from a warmup window, then contributes on a
/// schedule and rebalances whenever the monitor asks for it.
pub struct DcaSimulator {
    config: BacktestConfig,
    optimizer: PortfolioOptimizer,
    monitor: RebalanceMonitor,
    planner: TradePlanner,
}

impl DcaSimulator {
    /// Create a new simulator, rejecting invalid configuration up front.
    pub fn new(config: BacktestConfig) -> Result<Self, ConfigError> {
        if config.contribution_interval_days < 1 {
            return Err(ConfigError::OutOfRange {
                field: "contribution_interval_days".to_string(),
                value: config.contribution_interval_days as f64,
                min: 1.0,
                max: f64::INFINITY,
            });
        }
        if config.warmup_days < 2 {
            return Err(ConfigError::OutOfRange {
                field: "warmup_days".to_string(),
                value: config.warmup_days as f64,
                min: 2.0,
                max: f64::INFINITY,
            });
        }
        if config.initial_capital.is_sign_negative()
            || config.contribution_amount.is_sign_negative()
            || config.fee_bps.is_sign_negative()
        {
            return Err(ConfigError::Invalid(
                "capital, contribution and fee must be non-negative".to_string(),
            ));
        }
        config.rebalance.validate()?;
        config.planner.validate()?;

        Ok(Self {
            optimizer: PortfolioOptimizer::new(config.optimization.clone())?,
            monitor: RebalanceMonitor::new(config.rebalance.clone()),
            planner: TradePlanner::new(config.planner.clone()),
            config,
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run a backtest.
    pub async fn run(
        &self,
        histories: &BTreeMap<String, PriceSeries>,
        metadata: &BTreeMap<String, MarketMetadata>,
    ) -> DcaResult<BacktestReport> {
        let first_ts = histories
            .values()
            .filter_map(|s| s.first())
            .map(|p| p.timestamp)
            .min()
            .ok_or(DataError::NoDataAvailable)?;
        let start_ts = first_ts + Duration::days(self.config.warmup_days).num_milliseconds();

        let warmup: BTreeMap<String, PriceSeries> = histories
            .iter()
            .map(|(symbol, series)| (symbol.clone(), series.until(start_ts - 1)))
            .filter(|(_, series)| !series.is_empty())
            .collect();
        let outcome = self.optimizer.optimize(&warmup, metadata)?;
        let target = outcome.target;

        let timeline: Vec<i64> = histories
            .values()
            .flat_map(|s| s.timestamps())
            .filter(|ts| *ts >= start_ts)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|ts| Self::prices_at(histories, &target, *ts).is_some())
            .collect();
        let Some(&first_day) = timeline.first() else {
            return Err(DataError::NoDataAvailable.into());
        };

        let mut executor = PaperExecutor::new(Decimal::ZERO).with_fee_bps(self.config.fee_bps);
        let mut state =
            PortfolioState::new(BACKTEST_PORTFOLIO, target.clone(), to_datetime(first_day)?);
        let mut stats = BacktestStats::new();
        let mut executions = Vec::new();
        let mut last_contribution: Option<i64> = None;
        let interval_ms = Duration::days(self.config.contribution_interval_days).num_milliseconds();

        info!(
            assets = target.len(),
            days = timeline.len(),
            "starting DCA backtest"
        );

        for ts in timeline {
            let now = to_datetime(ts)?;
            let prices = Self::prices_at(histories, &target, ts).ok_or(DataError::NoDataAvailable)?;
            executor.set_prices(prices, now);

            let mut deposit = Decimal::ZERO;
            let due = last_contribution.map_or(true, |last| ts - last >= interval_ms);
            if due {
                if last_contribution.is_none() {
                    deposit += self.config.initial_capital;
                }
                deposit += self.config.contribution_amount;
                last_contribution = Some(ts);
            }
            if deposit > Decimal::ZERO {
                executor.deposit(deposit);
                stats.record_contribution(deposit);
                self.invest(&mut executor, &target, deposit, &mut stats).await?;
            }

            let snapshot = executor.snapshot()?;
            let decision = self
                .monitor
                .evaluate(&target, &snapshot, state.rebalance_anchor(), now);
            if decision.is_approved() {
                let actions = self.planner.plan(&decision, &snapshot, &target)?;
                let plan = RebalancePlan::new(BACKTEST_PORTFOLIO, &decision, actions, now);
                let execution = execute_plan(&mut executor, plan, &mut state, now).await;
                stats.record_rebalance(&execution);
                if !execution.fills.is_empty() || execution.status == ExecutionStatus::Failed {
                    executions.push(execution);
                }
            }

            stats.record_equity(ts, executor.snapshot()?.total_value, deposit);
        }

        let final_snapshot = executor.snapshot()?;
        stats.finalize(
            final_snapshot.total_value,
            final_snapshot.cash_balance,
            self.config.optimization.metrics.risk_free_rate,
            self.config.optimization.metrics.periods_per_year,
        );

        info!(
            final_value = %stats.final_value,
            invested = %stats.invested_capital,
            rebalances = stats.rebalances,
            "backtest complete"
        );

        Ok(BacktestReport {
            config: self.config.clone(),
            stats,
            target,
            final_holdings: executor.holdings().clone(),
            executions,
        })
    }

    /// Buy the target mix with freshly deposited cash.
    async fn invest(
        &self,
        executor: &mut PaperExecutor,
        target: &TargetAllocation,
        amount: Decimal,
        stats: &mut BacktestStats,
    ) -> DcaResult<()> {
        let plan = ContributionPlan::new(amount, target)?;
        let snapshot = executor.snapshot()?;

        for (symbol, notional) in &plan.allocations {
            if *notional <= Decimal::ZERO {
                continue;
            }
            let action = TradeAction {
                symbol: symbol.clone(),
                side: Side::Buy,
                notional: *notional,
                priority: TradeAction::PRIORITY_NORMAL,
                current_weight: snapshot.weight(symbol),
                target_weight: target.weight(symbol),
            };
            match executor.execute(&action).await {
                Ok(fill) => stats.record_fill(&fill),
                Err(err) => warn!(symbol = %symbol, error = %err, "contribution buy failed"),
            }
        }

        debug!(amount = %amount, "contribution invested");
        Ok(())
    }

    /// Last known close of every target symbol at `ts`, or `None` if any is missing.
    fn prices_at(
        histories: &BTreeMap<String, PriceSeries>,
        target: &TargetAllocation,
        ts: i64,
    ) -> Option<BTreeMap<String, Decimal>> {
        target
            .symbols()
            .into_iter()
            .map(|symbol| {
                let close = histories.get(symbol)?.close_as_of(ts)?;
                let price = Decimal::from_f64(close).filter(|p| *p > Decimal::ZERO)?;
                Some((symbol.to_string(), price))
            })
            .collect()
    }
}

fn to_datetime(ts: i64) -> Result<DateTime<Utc>, DataError> {
    DateTime::from_timestamp_millis(ts)
        .ok_or_else(|| DataError::ParseError(format!("timestamp out of range: {}", ts)))
}
