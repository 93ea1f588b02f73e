//! Rebalance decisions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Monitor state for one portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceState {
    /// Weights are within tolerance
    InTolerance,
    /// A trigger fired and the interval guard allows acting on it
    NeedsRebalance,
    /// A trigger fired but the minimum interval has not elapsed
    Throttled,
}

impl fmt::Display for RebalanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceState::InTolerance => write!(f, "IN_TOLERANCE"),
            RebalanceState::NeedsRebalance => write!(f, "NEEDS_REBALANCE"),
            RebalanceState::Throttled => write!(f, "THROTTLED"),
        }
    }
}

/// A condition that calls for a rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// One asset drifted past the threshold
    MaxDeviation {
        symbol: String,
        deviation: f64,
        threshold: f64,
    },
    /// The summed drift exceeded twice the threshold
    TotalDeviation { total: f64, limit: f64 },
    /// Too long since the last rebalance
    IntervalElapsed { elapsed_days: i64, max_days: i64 },
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::MaxDeviation {
                symbol,
                deviation,
                threshold,
            } => write!(
                f,
                "max deviation {:.3} on {} > threshold {:.3}",
                deviation, symbol, threshold
            ),
            Trigger::TotalDeviation { total, limit } => {
                write!(f, "total deviation {:.3} > {:.3}", total, limit)
            }
            Trigger::IntervalElapsed {
                elapsed_days,
                max_days,
            } => write!(
                f,
                "{} days since last rebalance > max interval of {} days",
                elapsed_days, max_days
            ),
        }
    }
}

/// Outcome of comparing a portfolio against its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceDecision {
    pub state: RebalanceState,
    /// True only in [`RebalanceState::NeedsRebalance`]
    pub needed: bool,
    /// Human-readable explanation
    pub reason: String,
    /// Conditions that fired, even when throttled
    pub triggers: Vec<Trigger>,
    /// Sum of absolute deviations
    pub total_deviation: f64,
    /// Largest absolute deviation
    pub max_deviation: f64,
    /// Absolute deviation per symbol
    pub per_asset_deviation: BTreeMap<String, f64>,
    /// Seconds since the last rebalance
    pub elapsed_seconds: i64,
}

impl RebalanceDecision {
    /// Check if the decision approves a rebalance.
    pub fn is_approved(&self) -> bool {
        self.state == RebalanceState::NeedsRebalance
    }

    /// Check if a rebalance was wanted but blocked by the interval guard.
    pub fn is_throttled(&self) -> bool {
        self.state == RebalanceState::Throttled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_reason_strings() {
        let trigger = Trigger::MaxDeviation {
            symbol: "BTC".to_string(),
            deviation: 0.1,
            threshold: 0.05,
        };
        assert_eq!(
            trigger.to_string(),
            "max deviation 0.100 on BTC > threshold 0.050"
        );

        let trigger = Trigger::IntervalElapsed {
            elapsed_days: 31,
            max_days: 30,
        };
        assert_eq!(
            trigger.to_string(),
            "31 days since last rebalance > max interval of 30 days"
        );
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&RebalanceState::NeedsRebalance).unwrap();
        assert_eq!(json, "\"NEEDS_REBALANCE\"");
    }
}
