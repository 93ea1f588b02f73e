//! Derived per-asset statistics.

use serde::{Deserialize, Serialize};

/// External metadata about an asset that is not part of its price history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMetadata {
    /// Most recent 24h traded volume
    pub volume_24h: Option<f64>,
    /// Market capitalization
    pub market_cap: Option<f64>,
}

impl MarketMetadata {
    /// Metadata carrying only a 24h volume.
    pub fn with_volume_24h(volume_24h: f64) -> Self {
        Self {
            volume_24h: Some(volume_24h),
            market_cap: None,
        }
    }
}

/// Statistics computed from one asset's price history.
///
/// Always recomputed from the current history; never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetrics {
    pub symbol: String,
    /// Return over the whole series (last / first - 1)
    pub total_return: f64,
    /// Sample standard deviation of daily returns, annualized
    pub annualized_volatility: f64,
    /// Annualized excess return over annualized volatility
    pub sharpe_ratio: f64,
    /// Annualized mean return over downside deviation
    pub sortino_ratio: f64,
    /// Return over the short momentum window
    pub momentum: f64,
    /// Return over the long momentum window
    pub long_momentum: f64,
    /// Deepest peak-to-trough decline (zero or negative)
    pub max_drawdown: f64,
    /// Mean of the volume column
    pub avg_volume: f64,
    /// Recent 24h volume relative to the average volume
    pub liquidity_score: f64,
    /// Number of observations the metrics were computed from
    pub data_points: usize,
    /// Set when the history was too short and neutral values were substituted
    pub insufficient_data: bool,
}

impl AssetMetrics {
    /// All-zero metrics for a series too short to analyze.
    pub fn insufficient(symbol: impl Into<String>, data_points: usize) -> Self {
        Self {
            symbol: symbol.into(),
            total_return: 0.0,
            annualized_volatility: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            momentum: 0.0,
            long_momentum: 0.0,
            max_drawdown: 0.0,
            avg_volume: 0.0,
            liquidity_score: 0.0,
            data_points,
            insufficient_data: true,
        }
    }
}
