//! Trade planning for an approved rebalance.

use dca_core::error::{ConfigError, ExecutionError};
use dca_core::types::{
    PortfolioSnapshot, RebalanceDecision, Side, TargetAllocation, TradeAction,
};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Trade planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Trades smaller than this are deferred to priority 5
    pub min_trade_notional: Decimal,
    /// Deviations at or below this produce no trade
    pub deadband: f64,
    /// Deviations above this get priority 1
    pub high_priority_deviation: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_trade_notional: dec!(10),
            deadband: 0.01,
            high_priority_deviation: 0.05,
        }
    }
}

impl PlannerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_trade_notional.is_sign_negative() {
            return Err(ConfigError::Invalid(format!(
                "min_trade_notional must be non-negative, got {}",
                self.min_trade_notional
            )));
        }
        if !(0.0..1.0).contains(&self.deadband) {
            return Err(ConfigError::OutOfRange {
                field: "deadband".to_string(),
                value: self.deadband,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

/// Turns an approved rebalance decision into prioritized trades.
#[derive(Debug, Clone, Default)]
pub struct TradePlanner {
    config: PlannerConfig,
}

impl TradePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan trades that move the snapshot toward the target.
    ///
    /// Only a `NEEDS_REBALANCE` decision is accepted. Each symbol whose deviation exceeds
    /// the deadband gets one action sized at `|deviation| * total_value`. Small trades are
    /// deferred to priority 5 rather than dropped. Actions are ordered by priority.
    pub fn plan(
        &self,
        decision: &RebalanceDecision,
        snapshot: &PortfolioSnapshot,
        target: &TargetAllocation,
    ) -> Result<Vec<TradeAction>, ExecutionError> {
        if !decision.is_approved() {
            return Err(ExecutionError::NotApproved(format!(
                "{}: {}",
                decision.state, decision.reason
            )));
        }

        let symbols: BTreeSet<&str> = target
            .symbols()
            .into_iter()
            .chain(snapshot.symbols())
            .collect();

        let mut actions = Vec::new();
        for symbol in symbols {
            let current_weight = snapshot.weight(symbol);
            let target_weight = target.weight(symbol);
            let deviation = current_weight - target_weight;

            if deviation.abs() <= self.config.deadband {
                debug!(symbol, deviation, "inside deadband");
                continue;
            }

            let Some(fraction) = Decimal::from_f64(deviation.abs()) else {
                warn!(
                    symbol,
                    current_weight,
                    target_weight,
                    "deviation is not a finite number, skipping"
                );
                continue;
            };
            let notional = (fraction * snapshot.total_value).round_dp(2);
            let side = if deviation > 0.0 { Side::Sell } else { Side::Buy };

            let mut priority = if deviation.abs() > self.config.high_priority_deviation {
                TradeAction::PRIORITY_HIGH
            } else {
                TradeAction::PRIORITY_NORMAL
            };
            if notional < self.config.min_trade_notional {
                priority = TradeAction::PRIORITY_DEFERRED;
            }

            actions.push(TradeAction {
                symbol: symbol.to_string(),
                side,
                notional,
                priority,
                current_weight,
                target_weight,
            });
        }

        actions.sort_by_key(|a| a.priority);

        info!(
            actions = actions.len(),
            deferred = actions
                .iter()
                .filter(|a| a.priority == TradeAction::PRIORITY_DEFERRED)
                .count(),
            "planned rebalance trades"
        );

        Ok(actions)
    }
}
