//! Historical statistics of a weighted portfolio.

use dca_core::types::{PriceSeries, TargetAllocation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::returns::timestamped_returns;
use crate::stats;

/// Statistics of a fixed-weight portfolio replayed over the shared history of its assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub total_return: f64,
    /// Number of daily returns all assets had in common
    pub observations: usize,
}

impl PortfolioStats {
    /// Compute over the dates where every allocated asset has a return.
    ///
    /// Assets without history contribute nothing; an allocation with no shared dates
    /// yields all-zero stats.
    pub fn compute(
        allocation: &TargetAllocation,
        histories: &BTreeMap<String, PriceSeries>,
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Self {
        let mut per_asset: Vec<(f64, BTreeMap<i64, f64>)> = Vec::new();
        for (symbol, weight) in allocation.iter() {
            if let Some(series) = histories.get(symbol) {
                per_asset.push((weight, timestamped_returns(series).into_iter().collect()));
            }
        }

        let Some((_, first)) = per_asset.first() else {
            return Self::default();
        };

        let returns: Vec<f64> = first
            .keys()
            .filter(|ts| per_asset.iter().all(|(_, r)| r.contains_key(ts)))
            .map(|ts| {
                per_asset
                    .iter()
                    .map(|(w, r)| w * r.get(ts).copied().unwrap_or(0.0))
                    .sum()
            })
            .collect();

        if returns.is_empty() {
            return Self::default();
        }

        let mut equity = Vec::with_capacity(returns.len() + 1);
        equity.push(1.0);
        for r in &returns {
            let last = equity.last().copied().unwrap_or(1.0);
            equity.push(last * (1.0 + r));
        }

        Self {
            annualized_volatility: stats::annualized_volatility(&returns, periods_per_year),
            sharpe_ratio: stats::sharpe_ratio(&returns, risk_free_rate, periods_per_year),
            sortino_ratio: stats::sortino_ratio(&returns, periods_per_year),
            max_drawdown: stats::max_drawdown(&equity),
            total_return: stats::total_return(&equity),
            observations: returns.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::PERIODS_PER_YEAR;
    use dca_core::types::PricePoint;

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(i as i64, c, 1.0))
            .collect();
        PriceSeries::from_points(symbol, points).unwrap()
    }

    #[test]
    fn test_weighted_returns() {
        let mut histories = BTreeMap::new();
        histories.insert("A".to_string(), series("A", &[100.0, 110.0]));
        histories.insert("B".to_string(), series("B", &[100.0, 90.0]));

        let allocation: TargetAllocation =
            [("A".to_string(), 0.5), ("B".to_string(), 0.5)].into_iter().collect();
        let stats = PortfolioStats::compute(&allocation, &histories, 0.0, PERIODS_PER_YEAR);

        assert_eq!(stats.observations, 1);
        assert!(stats.total_return.abs() < 1e-12);
    }

    #[test]
    fn test_drawdown_of_single_asset() {
        let mut histories = BTreeMap::new();
        histories.insert("A".to_string(), series("A", &[100.0, 120.0, 60.0, 90.0]));

        let allocation: TargetAllocation = [("A".to_string(), 1.0)].into_iter().collect();
        let stats = PortfolioStats::compute(&allocation, &histories, 0.0, PERIODS_PER_YEAR);

        assert_eq!(stats.observations, 3);
        assert!((stats.max_drawdown + 0.5).abs() < 1e-12);
        assert!((stats.total_return + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_no_history() {
        let allocation: TargetAllocation = [("A".to_string(), 1.0)].into_iter().collect();
        let stats = PortfolioStats::compute(&allocation, &BTreeMap::new(), 0.0, PERIODS_PER_YEAR);
        assert_eq!(stats, PortfolioStats::default());
    }
}
