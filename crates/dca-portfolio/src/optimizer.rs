//! End-to-end construction pipeline.

use dca_core::error::{AllocationError, ConfigError};
use dca_core::types::{AssetMetrics, MarketMetadata, PriceSeries, ScoredAsset, TargetAllocation};
use dca_metrics::{CorrelationConfig, CorrelationMatrix, MetricsConfig, MetricsEngine, PortfolioStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::allocator::{AllocatorConfig, WeightAllocator};
use crate::selector::{AssetSelector, SelectorConfig};

/// Full configuration of one optimization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub metrics: MetricsConfig,
    pub correlation: CorrelationConfig,
    pub selector: SelectorConfig,
    pub allocator: AllocatorConfig,
}

impl OptimizationConfig {
    /// Validate every section and their combination.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.momentum_window == 0 {
            return Err(ConfigError::Invalid(
                "momentum_window must be at least 1".to_string(),
            ));
        }
        if self.metrics.long_momentum_window < self.metrics.momentum_window {
            return Err(ConfigError::Invalid(format!(
                "long_momentum_window ({}) must not be shorter than momentum_window ({})",
                self.metrics.long_momentum_window, self.metrics.momentum_window
            )));
        }
        if !(-1.0..=1.0).contains(&self.metrics.risk_free_rate) {
            return Err(ConfigError::OutOfRange {
                field: "risk_free_rate".to_string(),
                value: self.metrics.risk_free_rate,
                min: -1.0,
                max: 1.0,
            });
        }
        self.selector.validate()?;
        self.allocator.validate()?;
        self.allocator
            .validate_for_basket(self.selector.min_assets, self.selector.max_assets)?;
        Ok(())
    }
}

/// Everything produced by an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub target: TargetAllocation,
    /// Selected assets in rank order
    pub selected: Vec<ScoredAsset>,
    /// Every eligible asset in rank order
    pub ranked: Vec<ScoredAsset>,
    pub metrics: BTreeMap<String, AssetMetrics>,
    pub excluded: Vec<String>,
    pub backfilled: Vec<String>,
    /// Mean absolute pairwise correlation inside the basket
    pub average_correlation: f64,
}

/// Runs metrics, correlation, selection and allocation in order.
#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    config: OptimizationConfig,
    engine: MetricsEngine,
    selector: AssetSelector,
    allocator: WeightAllocator,
}

impl PortfolioOptimizer {
    /// Create an optimizer, rejecting invalid configuration up front.
    pub fn new(config: OptimizationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine: MetricsEngine::new(config.metrics.clone()),
            selector: AssetSelector::new(config.selector.clone()),
            allocator: WeightAllocator::new(config.allocator.clone()),
            config,
        })
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Build a target allocation from price histories.
    ///
    /// Deterministic: identical inputs produce identical outcomes.
    pub fn optimize(
        &self,
        histories: &BTreeMap<String, PriceSeries>,
        metadata: &BTreeMap<String, MarketMetadata>,
    ) -> Result<OptimizationOutcome, AllocationError> {
        if histories.is_empty() {
            return Err(AllocationError::EmptyUniverse);
        }

        let metrics = self.engine.compute_all(histories, metadata);
        let correlations = CorrelationMatrix::from_histories(histories, &self.config.correlation);
        let selection = self.selector.select(&metrics, metadata, &correlations)?;
        let target = self.allocator.allocate(&selection.scores())?;
        let average_correlation = correlations.average_abs_correlation(&selection.symbols());

        info!(
            universe = histories.len(),
            selected = target.len(),
            average_correlation,
            "optimization complete"
        );

        Ok(OptimizationOutcome {
            target,
            selected: selection.selected,
            ranked: selection.ranked,
            metrics,
            excluded: selection.excluded,
            backfilled: selection.backfilled,
            average_correlation,
        })
    }

    /// Historical statistics of an allocation.
    pub fn stats(
        &self,
        target: &TargetAllocation,
        histories: &BTreeMap<String, PriceSeries>,
    ) -> PortfolioStats {
        PortfolioStats::compute(
            target,
            histories,
            self.config.metrics.risk_free_rate,
            self.config.metrics.periods_per_year,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_core::types::PricePoint;

    const DAY: i64 = 86_400_000;

    fn create_series(symbol: &str, days: usize, drift: f64, phase: f64) -> PriceSeries {
        let points = (0..days)
            .map(|i| {
                let t = i as f64;
                let close = 100.0 * (1.0 + drift).powf(t) * (1.0 + 0.03 * (t * 0.7 + phase).sin());
                PricePoint::new(i as i64 * DAY, close, 1_000.0 + 10.0 * t)
            })
            .collect();
        PriceSeries::from_points(symbol, points).unwrap()
    }

    fn create_histories() -> BTreeMap<String, PriceSeries> {
        [
            ("BTC", 0.004, 0.0),
            ("ETH", 0.003, 1.3),
            ("SOL", 0.006, 2.1),
            ("ADA", -0.001, 0.4),
            ("DOT", 0.001, 3.0),
        ]
        .into_iter()
        .map(|(s, drift, phase)| (s.to_string(), create_series(s, 120, drift, phase)))
        .collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = OptimizationConfig::default();
        config.selector.min_assets = 9;
        assert!(matches!(
            PortfolioOptimizer::new(config),
            Err(ConfigError::BasketBounds { .. })
        ));
    }

    #[test]
    fn test_optimize_produces_valid_allocation() {
        let optimizer = PortfolioOptimizer::new(OptimizationConfig::default()).unwrap();
        let outcome = optimizer
            .optimize(&create_histories(), &BTreeMap::new())
            .unwrap();

        assert!(outcome.target.validate().is_ok());
        assert!(outcome.target.len() >= 3 && outcome.target.len() <= 8);
        assert_eq!(outcome.metrics.len(), 5);
        assert_eq!(outcome.ranked.len(), 5);
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let optimizer = PortfolioOptimizer::new(OptimizationConfig::default()).unwrap();
        let histories = create_histories();
        let first = optimizer.optimize(&histories, &BTreeMap::new()).unwrap();
        let second = optimizer.optimize(&histories, &BTreeMap::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_asset_universe() {
        let optimizer = PortfolioOptimizer::new(OptimizationConfig::default()).unwrap();
        let mut histories = BTreeMap::new();
        histories.insert("BTC".to_string(), create_series("BTC", 60, 0.002, 0.0));

        let outcome = optimizer.optimize(&histories, &BTreeMap::new()).unwrap();
        assert_eq!(outcome.target.len(), 1);
        assert!((outcome.target.weight("BTC") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_universe() {
        let optimizer = PortfolioOptimizer::new(OptimizationConfig::default()).unwrap();
        assert_eq!(
            optimizer.optimize(&BTreeMap::new(), &BTreeMap::new()),
            Err(AllocationError::EmptyUniverse)
        );
    }

    #[test]
    fn test_stats_for_outcome() {
        let optimizer = PortfolioOptimizer::new(OptimizationConfig::default()).unwrap();
        let histories = create_histories();
        let outcome = optimizer.optimize(&histories, &BTreeMap::new()).unwrap();
        let stats = optimizer.stats(&outcome.target, &histories);
        assert_eq!(stats.observations, 119);
        assert!(stats.max_drawdown <= 0.0);
    }
}
