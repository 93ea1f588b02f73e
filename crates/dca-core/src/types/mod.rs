//! Core data types for the DCA engine.

mod allocation;
mod metrics;
mod portfolio;
mod rebalance;
mod series;
mod trade;

pub use allocation::{Factor, ScoredAsset, TargetAllocation, WEIGHT_TOLERANCE};
pub use metrics::{AssetMetrics, MarketMetadata};
pub use portfolio::{PortfolioSnapshot, PortfolioState, PositionSnapshot};
pub use rebalance::{RebalanceDecision, RebalanceState, Trigger};
pub use series::{PricePoint, PriceSeries};
pub use trade::{Fill, Side, TradeAction};
