//! Multi-factor composite scoring.

use dca_core::error::ConfigError;
use dca_core::types::{AssetMetrics, Factor, ScoredAsset};
use dca_metrics::simd::minmax_simd;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance on the factor weight sum.
const FACTOR_SUM_TOLERANCE: f64 = 1e-6;

/// Weight of each factor in the composite score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub sharpe: f64,
    pub volume: f64,
    pub momentum: f64,
    #[serde(rename = "return")]
    pub total_return: f64,
    pub volatility: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            sharpe: 0.25,
            volume: 0.20,
            momentum: 0.20,
            total_return: 0.20,
            volatility: 0.15,
        }
    }
}

impl FactorWeights {
    pub fn new(sharpe: f64, volume: f64, momentum: f64, total_return: f64, volatility: f64) -> Self {
        Self {
            sharpe,
            volume,
            momentum,
            total_return,
            volatility,
        }
    }

    /// Weight for one factor.
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Sharpe => self.sharpe,
            Factor::Volume => self.volume,
            Factor::Momentum => self.momentum,
            Factor::Return => self.total_return,
            Factor::Volatility => self.volatility,
        }
    }

    pub fn sum(&self) -> f64 {
        Factor::ALL.iter().map(|f| self.get(*f)).sum()
    }

    /// Check that every weight is non-negative and that they sum to 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for factor in Factor::ALL {
            let weight = self.get(factor);
            if !(weight >= 0.0) {
                return Err(ConfigError::NegativeFactorWeight {
                    factor: factor.name().to_string(),
                    weight,
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > FACTOR_SUM_TOLERANCE {
            return Err(ConfigError::FactorWeightsSum { sum });
        }
        Ok(())
    }
}

/// Raw value of a factor before normalization.
fn raw_value(metrics: &AssetMetrics, factor: Factor) -> f64 {
    let value = match factor {
        Factor::Sharpe => metrics.sharpe_ratio,
        Factor::Volume => metrics.avg_volume,
        Factor::Momentum => metrics.momentum,
        Factor::Return => metrics.total_return,
        Factor::Volatility => metrics.annualized_volatility,
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Min-max scale into [0, 1]. A universe with no spread scales to 0.
fn normalize(values: &[f64]) -> Vec<f64> {
    match minmax_simd(values) {
        Some((min, max)) if max > min => values.iter().map(|v| (v - min) / (max - min)).collect(),
        _ => vec![0.0; values.len()],
    }
}

/// Score and rank a universe.
///
/// Each factor is min-max normalized across the universe. Volatility is inverted after
/// scaling when `penalize_volatility` is set. The result is sorted by composite score
/// descending, ties broken by symbol.
pub fn score_assets(
    metrics: &BTreeMap<String, AssetMetrics>,
    weights: &FactorWeights,
    penalize_volatility: bool,
) -> Vec<ScoredAsset> {
    let symbols: Vec<&String> = metrics.keys().collect();
    let mut components: BTreeMap<Factor, Vec<f64>> = BTreeMap::new();

    for factor in Factor::ALL {
        let raw: Vec<f64> = metrics.values().map(|m| raw_value(m, factor)).collect();
        let mut scaled = normalize(&raw);
        if factor == Factor::Volatility && penalize_volatility {
            scaled.iter_mut().for_each(|s| *s = 1.0 - *s);
        }
        components.insert(factor, scaled);
    }

    let mut scored: Vec<ScoredAsset> = symbols
        .iter()
        .enumerate()
        .map(|(i, symbol)| {
            let component_scores: BTreeMap<Factor, f64> = components
                .iter()
                .map(|(factor, values)| (*factor, values[i]))
                .collect();
            let composite_score = component_scores
                .iter()
                .map(|(factor, score)| weights.get(*factor) * score)
                .sum();
            ScoredAsset {
                symbol: (*symbol).clone(),
                component_scores,
                composite_score,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.composite_score
            .total_cmp(&a.composite_score)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    scored
}
