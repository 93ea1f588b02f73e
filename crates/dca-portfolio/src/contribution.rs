//! Splitting a recurring contribution across target weights.

use dca_core::error::ConfigError;
use dca_core::types::TargetAllocation;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cash amount to buy of each asset for one contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionPlan {
    /// Total contribution
    pub amount: Decimal,
    /// Cash per symbol, rounded to cents
    pub allocations: BTreeMap<String, Decimal>,
}

impl ContributionPlan {
    /// Split `amount` by target weight.
    ///
    /// Each share is rounded to cents; the rounding residual goes to the largest-weight
    /// asset so the shares add up to exactly `amount`.
    pub fn new(amount: Decimal, target: &TargetAllocation) -> Result<Self, ConfigError> {
        if amount.is_sign_negative() {
            return Err(ConfigError::Invalid(format!(
                "contribution amount must be non-negative, got {amount}"
            )));
        }

        let mut allocations: BTreeMap<String, Decimal> = target
            .iter()
            .map(|(symbol, weight)| {
                let weight = Decimal::from_f64(weight).unwrap_or(Decimal::ZERO);
                (symbol.to_string(), (amount * weight).round_dp(2))
            })
            .collect();

        let residual = amount - allocations.values().copied().sum::<Decimal>();
        if let Some((largest, _)) = target.largest() {
            if let Some(share) = allocations.get_mut(largest) {
                *share += residual;
            }
        }

        Ok(Self {
            amount,
            allocations,
        })
    }

    /// Cash for one symbol (zero when absent).
    pub fn get(&self, symbol: &str) -> Decimal {
        self.allocations.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of all shares.
    pub fn total(&self) -> Decimal {
        self.allocations.values().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn target(pairs: &[(&str, f64)]) -> TargetAllocation {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    #[test]
    fn test_weekly_split() {
        let plan = ContributionPlan::new(
            dec!(100),
            &target(&[("BTC", 0.5), ("ETH", 0.3), ("SOL", 0.2)]),
        )
        .unwrap();

        assert_eq!(plan.get("BTC"), dec!(50.00));
        assert_eq!(plan.get("ETH"), dec!(30.00));
        assert_eq!(plan.get("SOL"), dec!(20.00));
        assert_eq!(plan.total(), dec!(100));
    }

    #[test]
    fn test_residual_goes_to_largest() {
        let plan = ContributionPlan::new(
            dec!(100),
            &target(&[("A", 0.334), ("B", 0.333), ("C", 0.333)]),
        )
        .unwrap();

        assert_eq!(plan.get("B"), dec!(33.30));
        assert_eq!(plan.get("C"), dec!(33.30));
        assert_eq!(plan.get("A"), dec!(33.40));
        assert_eq!(plan.total(), dec!(100));

        let plan = ContributionPlan::new(
            dec!(10),
            &target(&[("A", 0.334), ("B", 0.333), ("C", 0.333)]),
        )
        .unwrap();
        assert_eq!(plan.total(), dec!(10));
        assert_eq!(plan.get("B"), dec!(3.33));
        assert_eq!(plan.get("A"), dec!(3.34));
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(ContributionPlan::new(dec!(-5), &target(&[("BTC", 1.0)])).is_err());
    }
}
