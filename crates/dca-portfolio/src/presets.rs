//! Named optimization presets.

use dca_core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocator::AllocatorConfig;
use crate::optimizer::OptimizationConfig;
use crate::scoring::FactorWeights;
use crate::selector::SelectorConfig;

/// Preset used when none is named.
pub const DEFAULT_PRESET: &str = "balanced";

/// Information about a registered preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    /// Preset name
    pub name: String,
    /// Preset description
    pub description: String,
    /// Full optimization configuration
    pub config: OptimizationConfig,
}

/// Registry of built-in optimization presets.
pub struct PresetRegistry {
    presets: BTreeMap<String, PresetInfo>,
}

impl PresetRegistry {
    /// Create a registry with all built-in presets.
    pub fn new() -> Self {
        let mut registry = Self {
            presets: BTreeMap::new(),
        };

        registry.register(
            DEFAULT_PRESET,
            "Even blend of risk-adjusted return, liquidity and trend",
            OptimizationConfig::default(),
        );

        let mut conservative = OptimizationConfig::default();
        conservative.selector = SelectorConfig {
            factor_weights: FactorWeights::new(0.35, 0.20, 0.05, 0.10, 0.30),
            correlation_threshold: 0.6,
            min_assets: 4,
            max_assets: 8,
            ..SelectorConfig::default()
        };
        conservative.allocator = AllocatorConfig {
            max_weight_per_asset: 0.30,
            ..AllocatorConfig::default()
        };
        registry.register(
            "conservative",
            "Favors Sharpe ratio and low volatility with a tighter correlation cap",
            conservative,
        );

        let mut growth = OptimizationConfig::default();
        growth.selector = SelectorConfig {
            factor_weights: FactorWeights::new(0.15, 0.10, 0.30, 0.35, 0.10),
            correlation_threshold: 0.8,
            min_assets: 3,
            max_assets: 6,
            penalize_volatility: false,
            ..SelectorConfig::default()
        };
        growth.allocator = AllocatorConfig {
            max_weight_per_asset: 0.45,
            ..AllocatorConfig::default()
        };
        registry.register(
            "growth",
            "Chases total return and momentum; volatility is rewarded",
            growth,
        );

        let mut momentum = OptimizationConfig::default();
        momentum.metrics.momentum_window = 21;
        momentum.metrics.long_momentum_window = 63;
        momentum.selector = SelectorConfig {
            factor_weights: FactorWeights::new(0.15, 0.15, 0.50, 0.10, 0.10),
            correlation_threshold: 0.75,
            penalize_volatility: false,
            ..SelectorConfig::default()
        };
        registry.register(
            "momentum",
            "Ranks primarily on recent price momentum over a 21-day window",
            momentum,
        );

        let mut diversified = OptimizationConfig::default();
        diversified.selector = SelectorConfig {
            factor_weights: FactorWeights::new(0.25, 0.20, 0.15, 0.15, 0.25),
            correlation_threshold: 0.5,
            min_assets: 5,
            max_assets: 12,
            ..SelectorConfig::default()
        };
        diversified.allocator = AllocatorConfig {
            min_weight_per_asset: 0.04,
            max_weight_per_asset: 0.25,
            ..AllocatorConfig::default()
        };
        registry.register(
            "diversified",
            "Larger basket with a strict correlation cap and flatter weights",
            diversified,
        );

        registry
    }

    fn register(&mut self, name: &str, description: &str, config: OptimizationConfig) {
        self.presets.insert(
            name.to_string(),
            PresetInfo {
                name: name.to_string(),
                description: description.to_string(),
                config,
            },
        );
    }

    /// List all presets in name order.
    pub fn list(&self) -> Vec<&PresetInfo> {
        self.presets.values().collect()
    }

    /// Get preset info by name.
    pub fn get(&self, name: &str) -> Option<&PresetInfo> {
        self.presets.get(name)
    }

    /// Check if a preset exists.
    pub fn exists(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Get all preset names.
    pub fn names(&self) -> Vec<&String> {
        self.presets.keys().collect()
    }

    /// Configuration of a preset.
    pub fn config(&self, name: &str) -> Result<OptimizationConfig, ConfigError> {
        self.get(name)
            .map(|info| info.config.clone())
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
