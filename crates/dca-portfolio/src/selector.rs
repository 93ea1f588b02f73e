//! Correlation-aware asset selection.

use dca_core::error::{AllocationError, ConfigError};
use dca_core::types::{AssetMetrics, MarketMetadata, ScoredAsset};
use dca_metrics::CorrelationMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::scoring::{score_assets, FactorWeights};

/// Asset selector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub factor_weights: FactorWeights,
    /// Maximum absolute correlation with any already-selected asset
    pub correlation_threshold: f64,
    pub min_assets: usize,
    pub max_assets: usize,
    /// Lower volatility scores higher when set
    pub penalize_volatility: bool,
    /// Exclude assets whose known 24h volume is below this
    pub min_volume_24h: Option<f64>,
    /// Exclude assets whose known market cap is below this
    pub min_market_cap: Option<f64>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            factor_weights: FactorWeights::default(),
            correlation_threshold: 0.7,
            min_assets: 3,
            max_assets: 8,
            penalize_volatility: true,
            min_volume_24h: None,
            min_market_cap: None,
        }
    }
}

impl SelectorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.factor_weights.validate()?;
        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "correlation_threshold".to_string(),
                value: self.correlation_threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.min_assets == 0 {
            return Err(ConfigError::ZeroMinAssets);
        }
        if self.min_assets > self.max_assets {
            return Err(ConfigError::BasketBounds {
                min: self.min_assets,
                max: self.max_assets,
            });
        }
        Ok(())
    }
}

/// Result of a selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected assets in rank order
    pub selected: Vec<ScoredAsset>,
    /// Every eligible asset in rank order
    pub ranked: Vec<ScoredAsset>,
    /// Assets removed by the eligibility filter
    pub excluded: Vec<String>,
    /// Selected assets that were admitted over the correlation cap
    pub backfilled: Vec<String>,
}

impl Selection {
    /// Selected symbols in rank order.
    pub fn symbols(&self) -> Vec<String> {
        self.selected.iter().map(|a| a.symbol.clone()).collect()
    }

    /// Composite score per selected symbol.
    pub fn scores(&self) -> BTreeMap<String, f64> {
        self.selected
            .iter()
            .map(|a| (a.symbol.clone(), a.composite_score))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Ranks assets and greedily picks a diversified basket.
#[derive(Debug, Clone, Default)]
pub struct AssetSelector {
    config: SelectorConfig,
}

impl AssetSelector {
    /// Create a selector. The configuration is assumed to be validated.
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Check an asset against the metadata thresholds.
    ///
    /// Assets without metadata for a threshold pass that threshold.
    fn is_eligible(&self, metadata: Option<&MarketMetadata>) -> bool {
        let Some(meta) = metadata else {
            return true;
        };
        let volume_ok = match (self.config.min_volume_24h, meta.volume_24h) {
            (Some(min), Some(volume)) => volume >= min,
            _ => true,
        };
        let cap_ok = match (self.config.min_market_cap, meta.market_cap) {
            (Some(min), Some(cap)) => cap >= min,
            _ => true,
        };
        volume_ok && cap_ok
    }

    /// Select a basket from the universe.
    ///
    /// Candidates are accepted in score order while their absolute correlation with every
    /// accepted asset is within the threshold, up to `max_assets`. If that leaves fewer than
    /// `min_assets`, rejected candidates are backfilled in score order regardless of
    /// correlation. A universe smaller than `min_assets` yields every eligible asset.
    pub fn select(
        &self,
        metrics: &BTreeMap<String, AssetMetrics>,
        metadata: &BTreeMap<String, MarketMetadata>,
        correlations: &CorrelationMatrix,
    ) -> Result<Selection, AllocationError> {
        let mut excluded = Vec::new();
        let eligible: BTreeMap<String, AssetMetrics> = metrics
            .iter()
            .filter(|(symbol, _)| {
                let keep = self.is_eligible(metadata.get(*symbol));
                if !keep {
                    info!(symbol = %symbol, "excluded by eligibility filter");
                    excluded.push((*symbol).clone());
                }
                keep
            })
            .map(|(s, m)| (s.clone(), m.clone()))
            .collect();

        if eligible.is_empty() {
            return Err(AllocationError::EmptyUniverse);
        }

        let ranked = score_assets(
            &eligible,
            &self.config.factor_weights,
            self.config.penalize_volatility,
        );

        let threshold = self.config.correlation_threshold;
        let mut accepted: Vec<usize> = Vec::new();
        let mut rejected: Vec<usize> = Vec::new();

        for (idx, candidate) in ranked.iter().enumerate() {
            if accepted.len() >= self.config.max_assets {
                break;
            }
            let conflict = accepted.iter().find(|&&i| {
                correlations
                    .get(&ranked[i].symbol, &candidate.symbol)
                    .abs()
                    > threshold
            });
            match conflict {
                Some(&i) => {
                    debug!(
                        symbol = %candidate.symbol,
                        correlated_with = %ranked[i].symbol,
                        correlation = correlations.get(&ranked[i].symbol, &candidate.symbol),
                        "rejected for diversification"
                    );
                    rejected.push(idx);
                }
                None => accepted.push(idx),
            }
        }

        let mut backfilled = Vec::new();
        if accepted.len() < self.config.min_assets {
            for idx in rejected {
                if accepted.len() >= self.config.min_assets {
                    break;
                }
                warn!(
                    symbol = %ranked[idx].symbol,
                    min_assets = self.config.min_assets,
                    "backfilling over correlation cap to reach minimum basket size"
                );
                backfilled.push(ranked[idx].symbol.clone());
                accepted.push(idx);
            }
        }

        if accepted.len() < self.config.min_assets {
            warn!(
                available = accepted.len(),
                min_assets = self.config.min_assets,
                "universe smaller than minimum basket size"
            );
        }

        accepted.sort_unstable();
        let selected: Vec<ScoredAsset> = accepted.iter().map(|&i| ranked[i].clone()).collect();

        info!(
            selected = selected.len(),
            universe = ranked.len(),
            backfilled = backfilled.len(),
            "asset selection complete"
        );

        Ok(Selection {
            selected,
            ranked,
            excluded,
            backfilled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_metrics::CorrelationConfig;
    use proptest::prelude::*;

    fn create_metrics(symbol: &str, sharpe: f64) -> AssetMetrics {
        AssetMetrics {
            sharpe_ratio: sharpe,
            insufficient_data: false,
            ..AssetMetrics::insufficient(symbol, 100)
        }
    }

    fn sharpe_only(min_assets: usize, max_assets: usize, threshold: f64) -> SelectorConfig {
        SelectorConfig {
            factor_weights: FactorWeights::new(1.0, 0.0, 0.0, 0.0, 0.0),
            correlation_threshold: threshold,
            min_assets,
            max_assets,
            ..SelectorConfig::default()
        }
    }

    fn universe(sharpes: &[(&str, f64)]) -> BTreeMap<String, AssetMetrics> {
        sharpes
            .iter()
            .map(|(s, sharpe)| (s.to_string(), create_metrics(s, *sharpe)))
            .collect()
    }

    /// Return series where A and B move together and C, D are independent of them.
    fn correlated_returns() -> CorrelationMatrix {
        let mut returns = BTreeMap::new();
        returns.insert(
            "A".to_string(),
            vec![(1, 0.01), (2, 0.02), (3, -0.01), (4, 0.03), (5, -0.02)],
        );
        returns.insert(
            "B".to_string(),
            vec![(1, 0.011), (2, 0.019), (3, -0.012), (4, 0.028), (5, -0.018)],
        );
        returns.insert(
            "C".to_string(),
            vec![(1, 0.01), (2, -0.01), (3, 0.01), (4, -0.01), (5, 0.0)],
        );
        returns.insert(
            "D".to_string(),
            vec![(1, -0.02), (2, 0.0), (3, 0.02), (4, 0.0), (5, 0.0)],
        );
        CorrelationMatrix::from_returns(&returns, &CorrelationConfig::default())
    }

    #[test]
    fn test_config_validation() {
        assert!(SelectorConfig::default().validate().is_ok());

        let config = SelectorConfig {
            min_assets: 5,
            max_assets: 3,
            ..SelectorConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::BasketBounds { min: 5, max: 3 })
        );

        let config = SelectorConfig {
            min_assets: 0,
            ..SelectorConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinAssets));
    }

    #[test]
    fn test_respects_max_assets() {
        let metrics = universe(&[("A", 4.0), ("B", 3.0), ("C", 2.0), ("D", 1.0)]);
        let selector = AssetSelector::new(sharpe_only(1, 2, 1.0));
        let empty = CorrelationMatrix::from_returns(&BTreeMap::new(), &CorrelationConfig::default());
        let selection = selector
            .select(&metrics, &BTreeMap::new(), &empty)
            .unwrap();

        assert_eq!(selection.symbols(), vec!["A", "B"]);
        assert!(selection.backfilled.is_empty());
    }

    #[test]
    fn test_backfills_to_min_assets() {
        let correlations = correlated_returns();
        assert!(correlations.get("A", "B") > 0.9);

        let metrics = universe(&[("A", 4.0), ("B", 3.0), ("C", 2.0)]);
        let selector = AssetSelector::new(sharpe_only(3, 3, 0.7));
        let selection = selector
            .select(&metrics, &BTreeMap::new(), &correlations)
            .unwrap();

        assert_eq!(selection.len(), 3);
        assert_eq!(selection.backfilled, vec!["B".to_string()]);
        assert_eq!(selection.symbols(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_basket_size_within_bounds() {
        proptest!(|(
            assets in prop::collection::vec(
                (-3.0f64..3.0, prop::collection::vec(-0.05f64..0.05, 6)),
                1..=10,
            ),
            min_assets in 1usize..=4,
            extra in 0usize..=4,
            threshold in 0.0f64..=1.0,
        )| {
            let max_assets = min_assets + extra;
            let mut metrics = BTreeMap::new();
            let mut returns = BTreeMap::new();
            for (i, (sharpe, daily)) in assets.iter().enumerate() {
                let symbol = format!("A{}", i);
                metrics.insert(symbol.clone(), create_metrics(&symbol, *sharpe));
                returns.insert(
                    symbol,
                    daily.iter().enumerate().map(|(t, r)| (t as i64, *r)).collect::<Vec<_>>(),
                );
            }
            let correlations = CorrelationMatrix::from_returns(&returns, &CorrelationConfig::default());
            let selector = AssetSelector::new(sharpe_only(min_assets, max_assets, threshold));

            let selection = selector
                .select(&metrics, &BTreeMap::new(), &correlations)
                .unwrap();

            prop_assert!(selection.len() <= max_assets);
            prop_assert!(selection.len() >= min_assets.min(assets.len()));
        });
    }

    #[test]
    fn test_small_universe_returns_everything() {
        let metrics = universe(&[("A", 1.0)]);
        let selector = AssetSelector::new(sharpe_only(3, 5, 0.7));
        let selection = selector
            .select(&metrics, &BTreeMap::new(), &correlated_returns())
            .unwrap();
        assert_eq!(selection.symbols(), vec!["A"]);
    }

    #[test]
    fn test_empty_universe() {
        let selector = AssetSelector::new(SelectorConfig::default());
        let result = selector.select(&BTreeMap::new(), &BTreeMap::new(), &correlated_returns());
        assert_eq!(result, Err(AllocationError::EmptyUniverse));
    }

    #[test]
    fn test_eligibility_filter() {
        let metrics = universe(&[("A", 2.0), ("B", 1.0), ("C", 0.5)]);
        let mut metadata = BTreeMap::new();
        metadata.insert("A".to_string(), MarketMetadata::with_volume_24h(10.0));
        metadata.insert("B".to_string(), MarketMetadata::with_volume_24h(1_000.0));

        let selector = AssetSelector::new(SelectorConfig {
            min_volume_24h: Some(100.0),
            ..sharpe_only(1, 5, 1.0)
        });
        let selection = selector
            .select(&metrics, &metadata, &correlated_returns())
            .unwrap();

        assert_eq!(selection.excluded, vec!["A".to_string()]);
        assert_eq!(selection.symbols(), vec!["B", "C"]);
    }
}
