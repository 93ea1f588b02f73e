//! Rebalance monitor.

use chrono::{DateTime, Duration, Utc};
use dca_core::error::ConfigError;
use dca_core::types::{
    PortfolioSnapshot, RebalanceDecision, RebalanceState, TargetAllocation, Trigger,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Rebalance monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Per-asset deviation that triggers a rebalance; twice this bounds the total
    pub threshold: f64,
    /// Days that must pass after a rebalance before another may run
    pub min_interval_days: i64,
    /// Days after which a rebalance runs regardless of deviation
    pub max_interval_days: i64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            threshold: 0.05,
            min_interval_days: 7,
            max_interval_days: 30,
        }
    }
}

impl RebalanceConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "rebalance.threshold".to_string(),
                value: self.threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.min_interval_days < 0 {
            return Err(ConfigError::OutOfRange {
                field: "rebalance.min_interval_days".to_string(),
                value: self.min_interval_days as f64,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        if self.min_interval_days > self.max_interval_days {
            return Err(ConfigError::IntervalOrder {
                min_days: self.min_interval_days,
                max_days: self.max_interval_days,
            });
        }
        Ok(())
    }

    pub fn min_interval(&self) -> Duration {
        Duration::days(self.min_interval_days)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::days(self.max_interval_days)
    }
}

/// Decides whether a portfolio should be rebalanced.
///
/// Holds no state between calls. The caller supplies the time of the last rebalance and
/// is responsible for advancing it after a successful rebalance.
#[derive(Debug, Clone, Default)]
pub struct RebalanceMonitor {
    config: RebalanceConfig,
}

impl RebalanceMonitor {
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Absolute deviation for every targeted or held symbol.
    ///
    /// Held symbols missing from the target count as target weight 0.
    pub fn deviations(
        target: &TargetAllocation,
        snapshot: &PortfolioSnapshot,
    ) -> BTreeMap<String, f64> {
        let symbols: BTreeSet<&str> = target
            .symbols()
            .into_iter()
            .chain(snapshot.symbols())
            .collect();

        symbols
            .into_iter()
            .map(|symbol| {
                let deviation = (snapshot.weight(symbol) - target.weight(symbol)).abs();
                (symbol.to_string(), deviation)
            })
            .collect()
    }

    /// Evaluate a snapshot against its target.
    pub fn evaluate(
        &self,
        target: &TargetAllocation,
        snapshot: &PortfolioSnapshot,
        last_rebalance: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> RebalanceDecision {
        let per_asset_deviation = Self::deviations(target, snapshot);
        let total_deviation: f64 = per_asset_deviation.values().sum();
        let (max_symbol, max_deviation) = per_asset_deviation.iter().fold(
            (None, 0.0_f64),
            |(best_symbol, best), (symbol, &dev)| {
                if dev > best {
                    (Some(symbol.as_str()), dev)
                } else {
                    (best_symbol, best)
                }
            },
        );

        let elapsed = now - last_rebalance;
        let threshold = self.config.threshold;
        let mut triggers = Vec::new();

        if let Some(symbol) = max_symbol {
            if max_deviation > threshold {
                triggers.push(Trigger::MaxDeviation {
                    symbol: symbol.to_string(),
                    deviation: max_deviation,
                    threshold,
                });
            }
        }
        if total_deviation > 2.0 * threshold {
            triggers.push(Trigger::TotalDeviation {
                total: total_deviation,
                limit: 2.0 * threshold,
            });
        }
        if elapsed > self.config.max_interval() {
            triggers.push(Trigger::IntervalElapsed {
                elapsed_days: elapsed.num_days(),
                max_days: self.config.max_interval_days,
            });
        }

        let (state, reason) = if triggers.is_empty() {
            (
                RebalanceState::InTolerance,
                format!(
                    "within tolerance: max deviation {:.3} <= {:.3}",
                    max_deviation, threshold
                ),
            )
        } else {
            let fired = triggers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            if elapsed < self.config.min_interval() {
                (
                    RebalanceState::Throttled,
                    format!(
                        "throttled: {} days since last rebalance < min interval of {} days ({})",
                        elapsed.num_days(),
                        self.config.min_interval_days,
                        fired
                    ),
                )
            } else {
                (RebalanceState::NeedsRebalance, fired)
            }
        };

        match state {
            RebalanceState::InTolerance => debug!(
                total_deviation,
                max_deviation, "portfolio within tolerance"
            ),
            _ => info!(state = %state, reason = %reason, "rebalance trigger fired"),
        }

        RebalanceDecision {
            state,
            needed: state == RebalanceState::NeedsRebalance,
            reason,
            triggers,
            total_deviation,
            max_deviation,
            per_asset_deviation,
            elapsed_seconds: elapsed.num_seconds(),
        }
    }
}
