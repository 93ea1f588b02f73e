//! Data provider trait definitions.

use crate::error::DataError;
use crate::types::{MarketMetadata, PortfolioSnapshot, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for price history providers.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch the daily history of a symbol.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `since` - Drop observations before this instant when set
    ///
    /// # Returns
    /// A series ordered from oldest to newest
    async fn load_history(
        &self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<PriceSeries, DataError>;

    /// Fetch external metadata (24h volume, market cap) for a symbol.
    ///
    /// Providers without metadata return the empty default.
    async fn load_metadata(&self, _symbol: &str) -> Result<MarketMetadata, DataError> {
        Ok(MarketMetadata::default())
    }

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Trait for portfolio valuation providers.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch a fresh valuation of a portfolio.
    async fn snapshot(&self, portfolio_id: &str) -> Result<PortfolioSnapshot, DataError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}
