//! Configuration structures.

use dca_core::error::ConfigError;
use dca_portfolio::{FactorWeights, OptimizationConfig, PresetRegistry, DEFAULT_PRESET};
use dca_rebalance::{PlannerConfig, RebalanceConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub optimization: OptimizationSettings,
    #[serde(default)]
    pub rebalance: RebalanceSettings,
    #[serde(default)]
    pub backtest: BacktestSettings,
}

impl AppConfig {
    /// Check every section once, at load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.data.validate()?;
        self.optimization.to_optimization_config()?;
        self.rebalance.monitor_config().validate()?;
        self.rebalance.planner_config().validate()?;
        self.backtest.validate()?;
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "dca-engine".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Where histories and portfolio state live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory with one CSV per symbol
    pub dir: PathBuf,
    /// Directory for JSON state, snapshots and execution records
    pub state_dir: PathBuf,
    /// Symbols to consider; empty means every CSV in `dir`
    pub universe: Vec<String>,
    pub lookback_days: i64,
    pub max_concurrent_loads: usize,
    /// Snapshots older than this are refused
    pub max_snapshot_age_hours: i64,
    pub portfolio_id: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            state_dir: PathBuf::from("state"),
            universe: Vec::new(),
            lookback_days: 180,
            max_concurrent_loads: 4,
            max_snapshot_age_hours: 24,
            portfolio_id: "main".to_string(),
        }
    }
}

impl DataSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_days < 2 {
            return Err(ConfigError::OutOfRange {
                field: "data.lookback_days".to_string(),
                value: self.lookback_days as f64,
                min: 2.0,
                max: f64::INFINITY,
            });
        }
        if self.max_concurrent_loads == 0 {
            return Err(ConfigError::Invalid(
                "data.max_concurrent_loads must be at least 1".to_string(),
            ));
        }
        if self.max_snapshot_age_hours <= 0 {
            return Err(ConfigError::OutOfRange {
                field: "data.max_snapshot_age_hours".to_string(),
                value: self.max_snapshot_age_hours as f64,
                min: 1.0,
                max: f64::INFINITY,
            });
        }
        if self.portfolio_id.trim().is_empty() {
            return Err(ConfigError::Invalid("data.portfolio_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// A preset plus individual overrides.
///
/// Unset overrides keep the preset's value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationSettings {
    pub preset: String,
    pub factor_weights: Option<FactorWeights>,
    pub correlation_threshold: Option<f64>,
    pub min_assets: Option<usize>,
    pub max_assets: Option<usize>,
    pub min_weight_per_asset: Option<f64>,
    pub max_weight_per_asset: Option<f64>,
    pub risk_free_rate: Option<f64>,
    pub momentum_window: Option<usize>,
    pub penalize_volatility: Option<bool>,
    pub min_volume_24h: Option<f64>,
    pub min_market_cap: Option<f64>,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            preset: DEFAULT_PRESET.to_string(),
            factor_weights: None,
            correlation_threshold: None,
            min_assets: None,
            max_assets: None,
            min_weight_per_asset: None,
            max_weight_per_asset: None,
            risk_free_rate: None,
            momentum_window: None,
            penalize_volatility: None,
            min_volume_24h: None,
            min_market_cap: None,
        }
    }
}

impl OptimizationSettings {
    /// Resolve the preset, apply overrides and validate the result.
    pub fn to_optimization_config(&self) -> Result<OptimizationConfig, ConfigError> {
        let mut config = PresetRegistry::new().config(&self.preset)?;

        if let Some(weights) = self.factor_weights {
            config.selector.factor_weights = weights;
        }
        if let Some(threshold) = self.correlation_threshold {
            config.selector.correlation_threshold = threshold;
        }
        if let Some(min) = self.min_assets {
            config.selector.min_assets = min;
        }
        if let Some(max) = self.max_assets {
            config.selector.max_assets = max;
        }
        if let Some(penalize) = self.penalize_volatility {
            config.selector.penalize_volatility = penalize;
        }
        if self.min_volume_24h.is_some() {
            config.selector.min_volume_24h = self.min_volume_24h;
        }
        if self.min_market_cap.is_some() {
            config.selector.min_market_cap = self.min_market_cap;
        }
        if let Some(min) = self.min_weight_per_asset {
            config.allocator.min_weight_per_asset = min;
        }
        if let Some(max) = self.max_weight_per_asset {
            config.allocator.max_weight_per_asset = max;
        }
        if let Some(rate) = self.risk_free_rate {
            config.metrics.risk_free_rate = rate;
        }
        if let Some(window) = self.momentum_window {
            config.metrics.momentum_window = window;
            config.metrics.long_momentum_window = config.metrics.long_momentum_window.max(window);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Monitor and planner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceSettings {
    pub threshold: f64,
    pub min_interval_days: i64,
    pub max_interval_days: i64,
    pub min_trade_notional: Decimal,
    pub deadband: f64,
    pub high_priority_deviation: f64,
}

impl Default for RebalanceSettings {
    fn default() -> Self {
        let monitor = RebalanceConfig::default();
        let planner = PlannerConfig::default();
        Self {
            threshold: monitor.threshold,
            min_interval_days: monitor.min_interval_days,
            max_interval_days: monitor.max_interval_days,
            min_trade_notional: planner.min_trade_notional,
            deadband: planner.deadband,
            high_priority_deviation: planner.high_priority_deviation,
        }
    }
}

impl RebalanceSettings {
    pub fn monitor_config(&self) -> RebalanceConfig {
        RebalanceConfig {
            threshold: self.threshold,
            min_interval_days: self.min_interval_days,
            max_interval_days: self.max_interval_days,
        }
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            min_trade_notional: self.min_trade_notional,
            deadband: self.deadband,
            high_priority_deviation: self.high_priority_deviation,
        }
    }
}

/// Backtest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Cash invested on the first day
    pub initial_capital: Decimal,
    /// Cash invested every contribution interval
    pub contribution_amount: Decimal,
    pub contribution_interval_days: i64,
    pub fee_bps: Decimal,
    /// Days of history used to build the target before the simulation starts
    pub warmup_days: i64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self {
            initial_capital: dec!(1000),
            contribution_amount: dec!(100),
            contribution_interval_days: 7,
            fee_bps: dec!(10),
            warmup_days: 90,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital.is_sign_negative() || self.contribution_amount.is_sign_negative() {
            return Err(ConfigError::Invalid(
                "backtest capital and contribution must be non-negative".to_string(),
            ));
        }
        if self.contribution_interval_days < 1 {
            return Err(ConfigError::OutOfRange {
                field: "backtest.contribution_interval_days".to_string(),
                value: self.contribution_interval_days as f64,
                min: 1.0,
                max: f64::INFINITY,
            });
        }
        if self.fee_bps.is_sign_negative() {
            return Err(ConfigError::Invalid("backtest.fee_bps must be non-negative".to_string()));
        }
        if self.warmup_days < 2 {
            return Err(ConfigError::OutOfRange {
                field: "backtest.warmup_days".to_string(),
                value: self.warmup_days as f64,
                min: 2.0,
                max: f64::INFINITY,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_overrides_apply_on_top_of_preset() {
        let settings = OptimizationSettings {
            preset: "conservative".to_string(),
            correlation_threshold: Some(0.65),
            ..OptimizationSettings::default()
        };
        let config = settings.to_optimization_config().unwrap();
        assert_eq!(config.selector.correlation_threshold, 0.65);
        assert_eq!(config.selector.min_assets, 4);
        assert_eq!(config.allocator.max_weight_per_asset, 0.30);
    }

    #[test]
    fn test_bad_factor_weights_rejected() {
        let settings = OptimizationSettings {
            factor_weights: Some(FactorWeights::new(0.5, 0.5, 0.5, 0.0, 0.0)),
            ..OptimizationSettings::default()
        };
        assert!(matches!(
            settings.to_optimization_config(),
            Err(ConfigError::FactorWeightsSum { .. })
        ));
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let mut config = AppConfig::default();
        config.optimization.preset = "moonshot".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownPreset("moonshot".to_string()))
        );
    }

    #[test]
    fn test_interval_order_rejected() {
        let mut config = AppConfig::default();
        config.rebalance.min_interval_days = 60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IntervalOrder { .. })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.data.lookback_days, 180);
        assert_eq!(parsed.rebalance.min_trade_notional, config.rebalance.min_trade_notional);
    }
}
