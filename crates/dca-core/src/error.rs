//! Error types for the DCA engine.
//!
//! Errors fall into two tiers. Soft errors ([`MetricsError`]) are absorbed by the
//! component that raises them and replaced with a documented fallback value. Hard errors
//! ([`ConfigError`], [`AllocationError`]) propagate to the caller unmodified.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level engine error.
#[derive(Error, Debug)]
pub enum DcaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Invalid engine configuration. Always a caller programming error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Factor weights must sum to 1.0, got {sum:.6}")]
    FactorWeightsSum { sum: f64 },

    #[error("Factor weight for {factor} must be non-negative, got {weight}")]
    NegativeFactorWeight { factor: String, weight: f64 },

    #[error("min_assets ({min}) must not exceed max_assets ({max})")]
    BasketBounds { min: usize, max: usize },

    #[error("min_assets must be at least 1")]
    ZeroMinAssets,

    #[error("min_weight_per_asset ({min}) must not exceed max_weight_per_asset ({max})")]
    WeightBounds { min: f64, max: f64 },

    #[error("Weight bounds [{min_weight}, {max_weight}] cannot sum to 1.0 with {min_assets}..={max_assets} assets")]
    InfeasibleWeightBounds {
        min_weight: f64,
        max_weight: f64,
        min_assets: usize,
        max_assets: usize,
    },

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("min_interval ({min_days} days) must not exceed max_interval ({max_days} days)")]
    IntervalOrder { min_days: i64, max_days: i64 },

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Data provider and persistence errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Timestamps for {symbol} must be strictly increasing (offending timestamp {timestamp})")]
    NonMonotonicTimestamps { symbol: String, timestamp: i64 },

    #[error("No price available for {0}")]
    MissingPrice(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Soft metric errors. Never escape the metrics engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },
}

/// Allocation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("Asset universe is empty")]
    EmptyUniverse,

    #[error("No assets were selected")]
    EmptySelection,

    #[error("Weight for {symbol} is negative: {weight}")]
    NegativeWeight { symbol: String, weight: f64 },

    #[error("Weight for {symbol} is not finite: {weight}")]
    NonFiniteWeight { symbol: String, weight: f64 },

    #[error("Weights sum to {sum:.6}, expected 1.0 +/- {tolerance}")]
    SumMismatch { sum: f64, tolerance: f64 },
}

/// Trade execution errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Rebalance not approved: {0}")]
    NotApproved(String),

    #[error("No price available for {0}")]
    MissingPrice(String),

    #[error("Insufficient holdings of {symbol}: requested {requested}, available {available}")]
    InsufficientHoldings {
        symbol: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Insufficient cash: required {required}, available {available}")]
    InsufficientCash { required: Decimal, available: Decimal },

    #[error("Trade rejected: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Serialization(err.to_string())
    }
}

/// Result type alias for engine operations.
pub type DcaResult<T> = Result<T, DcaError>;
