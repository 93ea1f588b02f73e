//! Trade actions and fills.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Get the sign for holdings changes (+1 for buy, -1 for sell).
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => -Decimal::ONE,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// A planned trade toward the target allocation.
///
/// Consumed once by an execution collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeAction {
    pub symbol: String,
    pub side: Side,
    /// Trade size in quote currency
    pub notional: Decimal,
    /// 1 is most urgent, 5 is deferred
    pub priority: u8,
    /// Weight held when the action was planned
    pub current_weight: f64,
    /// Weight the action moves toward
    pub target_weight: f64,
}

impl TradeAction {
    /// Large deviation.
    pub const PRIORITY_HIGH: u8 = 1;
    /// Deviation inside the normal band.
    pub const PRIORITY_NORMAL: u8 = 2;
    /// Below the minimum trade notional; left for the caller to execute or skip.
    pub const PRIORITY_DEFERRED: u8 = 5;

    /// Signed weight deviation (current minus target).
    pub fn deviation(&self) -> f64 {
        self.current_weight - self.target_weight
    }

    /// Check if the action is urgent enough for a given priority cutoff.
    pub fn is_within_priority(&self, max_priority: u8) -> bool {
        self.priority <= max_priority
    }
}

/// Result of executing a trade action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: String,
    pub side: Side,
    /// Units bought or sold
    pub amount: Decimal,
    /// Execution price
    pub price: Decimal,
    /// Quote currency exchanged, before fees
    pub notional: Decimal,
    /// Fee charged
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.sign(), dec!(-1));
        assert_eq!(Side::Buy.to_string(), "buy");
    }

    #[test]
    fn test_action_deviation_and_priority() {
        let action = TradeAction {
            symbol: "BTC".to_string(),
            side: Side::Sell,
            notional: dec!(1000),
            priority: TradeAction::PRIORITY_HIGH,
            current_weight: 0.6,
            target_weight: 0.5,
        };
        assert!((action.deviation() - 0.1).abs() < 1e-12);
        assert!(action.is_within_priority(3));
        assert!(!TradeAction {
            priority: TradeAction::PRIORITY_DEFERRED,
            ..action
        }
        .is_within_priority(3));
    }
}
