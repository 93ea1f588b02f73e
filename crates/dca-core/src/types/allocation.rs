//! Scored assets and target allocations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::AllocationError;

/// Allowed drift of an allocation's weight sum away from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.001;

/// A ranking factor used in the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Sharpe,
    Volume,
    Momentum,
    Return,
    Volatility,
}

impl Factor {
    /// Every factor, in a fixed order.
    pub const ALL: [Factor; 5] = [
        Factor::Sharpe,
        Factor::Volume,
        Factor::Momentum,
        Factor::Return,
        Factor::Volatility,
    ];

    /// Factor name as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Factor::Sharpe => "sharpe",
            Factor::Volume => "volume",
            Factor::Momentum => "momentum",
            Factor::Return => "return",
            Factor::Volatility => "volatility",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An asset with its normalized factor scores and composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAsset {
    pub symbol: String,
    /// Each factor min-max scaled into [0, 1]
    pub component_scores: BTreeMap<Factor, f64>,
    /// Convex combination of the component scores
    pub composite_score: f64,
}

/// Target weight per symbol. Weights are non-negative and sum to 1.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetAllocation {
    weights: BTreeMap<String, f64>,
}

impl TargetAllocation {
    /// Wrap a weight map without validating it.
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    /// Build an allocation and check its integrity.
    pub fn try_new(weights: BTreeMap<String, f64>) -> Result<Self, AllocationError> {
        let allocation = Self { weights };
        allocation.validate()?;
        Ok(allocation)
    }

    /// Check non-negativity and the sum-to-one invariant.
    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.weights.is_empty() {
            return Err(AllocationError::EmptySelection);
        }
        for (symbol, &weight) in &self.weights {
            if !weight.is_finite() {
                return Err(AllocationError::NonFiniteWeight {
                    symbol: symbol.clone(),
                    weight,
                });
            }
            if weight < 0.0 {
                return Err(AllocationError::NegativeWeight {
                    symbol: symbol.clone(),
                    weight,
                });
            }
        }
        let sum = self.total();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AllocationError::SumMismatch {
                sum,
                tolerance: WEIGHT_TOLERANCE,
            });
        }
        Ok(())
    }

    /// Target weight for a symbol (0 when absent).
    pub fn weight(&self, symbol: &str) -> f64 {
        self.weights.get(symbol).copied().unwrap_or(0.0)
    }

    /// Check if a symbol is part of the target.
    pub fn contains(&self, symbol: &str) -> bool {
        self.weights.contains_key(symbol)
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Check if the allocation is empty.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Symbol with the largest weight; ties resolve to the first symbol in name order.
    pub fn largest(&self) -> Option<(&str, f64)> {
        self.weights
            .iter()
            .fold(None, |best: Option<(&str, f64)>, (symbol, &weight)| match best {
                Some((_, w)) if w >= weight => best,
                _ => Some((symbol.as_str(), weight)),
            })
    }

    /// Iterate over (symbol, weight) in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(s, &w)| (s.as_str(), w))
    }

    /// All symbols in name order.
    pub fn symbols(&self) -> Vec<&str> {
        self.weights.keys().map(String::as_str).collect()
    }

    /// Underlying weight map.
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }
}

impl FromIterator<(String, f64)> for TargetAllocation {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(pairs: &[(&str, f64)]) -> TargetAllocation {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    #[test]
    fn test_valid_allocation() {
        let target = allocation(&[("BTC", 0.5), ("ETH", 0.3), ("SOL", 0.2)]);
        assert!(target.validate().is_ok());
        assert_eq!(target.weight("ETH"), 0.3);
        assert_eq!(target.weight("DOGE"), 0.0);
    }

    #[test]
    fn test_tolerance_band() {
        assert!(allocation(&[("BTC", 0.5), ("ETH", 0.5009)]).validate().is_ok());
        assert!(matches!(
            allocation(&[("BTC", 0.5), ("ETH", 0.52)]).validate(),
            Err(AllocationError::SumMismatch { .. })
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let result = allocation(&[("BTC", 1.2), ("ETH", -0.2)]).validate();
        assert_eq!(
            result,
            Err(AllocationError::NegativeWeight {
                symbol: "ETH".to_string(),
                weight: -0.2
            })
        );
    }

    #[test]
    fn test_largest_prefers_first_symbol_on_tie() {
        let target = allocation(&[("ETH", 0.4), ("BTC", 0.4), ("SOL", 0.2)]);
        assert_eq!(target.largest(), Some(("BTC", 0.4)));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let target = allocation(&[("BTC", 0.6), ("ETH", 0.4)]);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"BTC":0.6,"ETH":0.4}"#);
    }
}
