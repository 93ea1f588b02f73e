//! Per-asset metrics engine.

use dca_core::error::MetricsError;
use dca_core::types::{AssetMetrics, MarketMetadata, PriceSeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::returns::simple_returns;
use crate::simd::mean_simd;
use crate::stats::{self, PERIODS_PER_YEAR};

/// Minimum observations needed to compute any metric.
pub const MIN_OBSERVATIONS: usize = 2;

/// Metrics engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Observations in the short momentum window
    pub momentum_window: usize,
    /// Observations in the long momentum window
    pub long_momentum_window: usize,
    /// Annualized risk-free rate as a fraction
    pub risk_free_rate: f64,
    /// Periods per year used for annualization
    pub periods_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            momentum_window: 30,
            long_momentum_window: 90,
            risk_free_rate: 0.02,
            periods_per_year: PERIODS_PER_YEAR,
        }
    }
}

/// Computes [`AssetMetrics`] from a price history.
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: MetricsConfig,
}

impl MetricsEngine {
    /// Create a new metrics engine.
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Compute metrics for one asset.
    ///
    /// A series shorter than two observations degrades to all-zero metrics with
    /// `insufficient_data` set instead of failing.
    pub fn compute(&self, series: &PriceSeries, metadata: Option<&MarketMetadata>) -> AssetMetrics {
        if let Err(err) = check_length(series, MIN_OBSERVATIONS) {
            warn!(symbol = %series.symbol, %err, "using neutral metrics");
            return AssetMetrics::insufficient(&series.symbol, series.len());
        }

        let closes = series.closes();
        let volumes = series.volumes();
        let returns = simple_returns(series);

        let total_return = stats::total_return(&closes);
        let annualized_volatility =
            stats::annualized_volatility(&returns, self.config.periods_per_year);
        let sharpe_ratio = stats::sharpe_ratio(
            &returns,
            self.config.risk_free_rate,
            self.config.periods_per_year,
        );
        let sortino_ratio = stats::sortino_ratio(&returns, self.config.periods_per_year);
        let avg_volume = mean_simd(&volumes);
        let liquidity_score = liquidity_score(metadata, avg_volume);

        let metrics = AssetMetrics {
            symbol: series.symbol.clone(),
            total_return,
            annualized_volatility,
            sharpe_ratio,
            sortino_ratio,
            momentum: momentum(&closes, self.config.momentum_window, total_return),
            long_momentum: momentum(&closes, self.config.long_momentum_window, total_return),
            max_drawdown: stats::max_drawdown(&closes),
            avg_volume,
            liquidity_score,
            data_points: series.len(),
            insufficient_data: false,
        };

        debug!(
            symbol = %metrics.symbol,
            total_return = metrics.total_return,
            volatility = metrics.annualized_volatility,
            sharpe = metrics.sharpe_ratio,
            momentum = metrics.momentum,
            "computed asset metrics"
        );

        metrics
    }

    /// Compute metrics for every asset in a universe.
    pub fn compute_all(
        &self,
        histories: &BTreeMap<String, PriceSeries>,
        metadata: &BTreeMap<String, MarketMetadata>,
    ) -> BTreeMap<String, AssetMetrics> {
        histories
            .iter()
            .map(|(symbol, series)| (symbol.clone(), self.compute(series, metadata.get(symbol))))
            .collect()
    }
}

fn check_length(series: &PriceSeries, required: usize) -> Result<(), MetricsError> {
    if series.len() < required {
        return Err(MetricsError::InsufficientData {
            required,
            available: series.len(),
        });
    }
    Ok(())
}

/// `close[-1] / close[-1 - window] - 1`, falling back to the whole-series return when the
/// history is shorter than `window + 1`.
fn momentum(closes: &[f64], window: usize, total_return: f64) -> f64 {
    if window == 0 || closes.len() < window + 1 {
        return total_return;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - window];
    if base > 0.0 {
        last / base - 1.0
    } else {
        0.0
    }
}

/// Recent 24h volume over average volume; 0 when either is unavailable.
fn liquidity_score(metadata: Option<&MarketMetadata>, avg_volume: f64) -> f64 {
    match metadata.and_then(|m| m.volume_24h) {
        Some(volume_24h) if avg_volume > 0.0 => volume_24h / avg_volume,
        _ => 0.0,
    }
}
