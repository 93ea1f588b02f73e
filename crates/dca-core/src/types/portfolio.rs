//! Portfolio snapshot and persisted portfolio state.

use chrono::{DateTime, Duration, Utc};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TargetAllocation;
use crate::error::DataError;

/// A held position at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Units held
    pub amount: Decimal,
    /// Market value of the units
    pub value: Decimal,
    /// Share of the portfolio's total value
    pub weight: f64,
}

/// Valuation of a live portfolio at one point in time.
///
/// Produced by a valuation collaborator. Weights are taken as given and are never
/// recomputed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Total portfolio value (positions plus cash)
    pub total_value: Decimal,
    /// Held positions by symbol
    pub positions: BTreeMap<String, PositionSnapshot>,
    /// Uninvested cash
    pub cash_balance: Decimal,
    /// Valuation time
    pub timestamp: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// Value holdings at the given prices.
    ///
    /// Every held symbol must have a price; nothing is estimated.
    pub fn from_holdings(
        holdings: &BTreeMap<String, Decimal>,
        prices: &BTreeMap<String, Decimal>,
        cash_balance: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DataError> {
        let mut values = BTreeMap::new();
        for (symbol, &amount) in holdings {
            if amount.is_zero() {
                continue;
            }
            let price = prices
                .get(symbol)
                .ok_or_else(|| DataError::MissingPrice(symbol.clone()))?;
            values.insert(symbol.clone(), (amount, amount * *price));
        }

        let total_value = cash_balance + values.values().map(|(_, v)| *v).sum::<Decimal>();
        let positions = values
            .into_iter()
            .map(|(symbol, (amount, value))| {
                let weight = if total_value > Decimal::ZERO {
                    (value / total_value).to_f64().unwrap_or(0.0)
                } else {
                    0.0
                };
                (
                    symbol,
                    PositionSnapshot {
                        amount,
                        value,
                        weight,
                    },
                )
            })
            .collect();

        Ok(Self {
            total_value,
            positions,
            cash_balance,
            timestamp,
        })
    }

    /// Current weight of a symbol (0 when not held).
    pub fn weight(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).map(|p| p.weight).unwrap_or(0.0)
    }

    /// Units held of a symbol.
    pub fn amount(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Time elapsed since the valuation.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }

    /// Check if the snapshot is older than `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }

    /// Symbols with a position.
    pub fn symbols(&self) -> Vec<&str> {
        self.positions.keys().map(String::as_str).collect()
    }
}

/// Persisted bookkeeping for one managed portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub portfolio_id: String,
    /// Current target allocation
    pub target: TargetAllocation,
    /// When the portfolio was set up
    pub created_at: DateTime<Utc>,
    /// Completion time of the last successful rebalance
    pub last_rebalance: Option<DateTime<Utc>>,
}

impl PortfolioState {
    /// Create state for a new portfolio.
    pub fn new(
        portfolio_id: impl Into<String>,
        target: TargetAllocation,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            portfolio_id: portfolio_id.into(),
            target,
            created_at,
            last_rebalance: None,
        }
    }

    /// Reference time for interval guards: the last rebalance, or inception if none.
    pub fn rebalance_anchor(&self) -> DateTime<Utc> {
        self.last_rebalance.unwrap_or(self.created_at)
    }

    /// Record a successful rebalance.
    pub fn mark_rebalanced(&mut self, at: DateTime<Utc>) {
        self.last_rebalance = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_from_holdings_weights() {
        let holdings = BTreeMap::from([
            ("BTC".to_string(), dec!(0.1)),
            ("ETH".to_string(), dec!(2)),
        ]);
        let prices = BTreeMap::from([
            ("BTC".to_string(), dec!(60000)),
            ("ETH".to_string(), dec!(2000)),
        ]);

        let snapshot = PortfolioSnapshot::from_holdings(&holdings, &prices, dec!(0), ts()).unwrap();
        assert_eq!(snapshot.total_value, dec!(10000));
        assert!((snapshot.weight("BTC") - 0.6).abs() < 1e-12);
        assert!((snapshot.weight("ETH") - 0.4).abs() < 1e-12);
        assert_eq!(snapshot.positions["ETH"].value, dec!(4000));
    }

    #[test]
    fn test_cash_dilutes_weights() {
        let holdings = BTreeMap::from([("BTC".to_string(), dec!(1))]);
        let prices = BTreeMap::from([("BTC".to_string(), dec!(100))]);

        let snapshot = PortfolioSnapshot::from_holdings(&holdings, &prices, dec!(100), ts()).unwrap();
        assert_eq!(snapshot.total_value, dec!(200));
        assert!((snapshot.weight("BTC") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_price_is_an_error() {
        let holdings = BTreeMap::from([("BTC".to_string(), dec!(1))]);
        let result = PortfolioSnapshot::from_holdings(&holdings, &BTreeMap::new(), dec!(0), ts());
        assert!(matches!(result, Err(DataError::MissingPrice(s)) if s == "BTC"));
    }

    #[test]
    fn test_staleness() {
        let snapshot = PortfolioSnapshot {
            total_value: dec!(0),
            positions: BTreeMap::new(),
            cash_balance: dec!(0),
            timestamp: ts(),
        };
        let later = ts() + Duration::hours(25);
        assert!(snapshot.is_stale(later, Duration::hours(24)));
        assert!(!snapshot.is_stale(later, Duration::hours(26)));
    }

    #[test]
    fn test_rebalance_anchor_falls_back_to_inception() {
        let mut state = PortfolioState::new("core", TargetAllocation::default(), ts());
        assert_eq!(state.rebalance_anchor(), ts());

        let later = ts() + Duration::days(10);
        state.mark_rebalanced(later);
        assert_eq!(state.rebalance_anchor(), later);
    }
}
