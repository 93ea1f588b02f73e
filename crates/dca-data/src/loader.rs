//! Concurrent loading of a symbol universe.

use chrono::{DateTime, Utc};
use dca_core::error::DataError;
use dca_core::traits::HistorySource;
use dca_core::types::{MarketMetadata, PriceSeries};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Outcome of loading a universe.
///
/// A symbol that fails to load is reported in `failures` and left out of the histories,
/// so one bad file never aborts a whole run.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub histories: BTreeMap<String, PriceSeries>,
    pub metadata: BTreeMap<String, MarketMetadata>,
    pub failures: BTreeMap<String, DataError>,
}

impl LoadReport {
    /// Symbols that loaded successfully, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        self.histories.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// Load histories and metadata for `symbols` with at most `max_concurrent` loads in flight.
pub async fn load_histories<S>(
    source: &S,
    symbols: &[String],
    since: Option<DateTime<Utc>>,
    max_concurrent: usize,
) -> LoadReport
where
    S: HistorySource + ?Sized,
{
    let results: Vec<_> = stream::iter(symbols.iter())
        .map(|symbol| async move {
            let history = source.load_history(symbol, since).await;
            let metadata = match history {
                Ok(_) => source.load_metadata(symbol).await,
                Err(_) => Ok(MarketMetadata::default()),
            };
            (symbol.to_uppercase(), history, metadata)
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let mut report = LoadReport::default();
    for (symbol, history, metadata) in results {
        match history {
            Ok(series) => {
                report.histories.insert(symbol.clone(), series);
                match metadata {
                    Ok(meta) => {
                        report.metadata.insert(symbol, meta);
                    }
                    Err(err) => {
                        warn!(symbol = %symbol, error = %err, "metadata unavailable");
                    }
                }
            }
            Err(err) => {
                warn!(symbol = %symbol, source = source.name(), error = %err, "skipping symbol");
                report.failures.insert(symbol, err);
            }
        }
    }

    info!(
        loaded = report.histories.len(),
        failed = report.failures.len(),
        source = source.name(),
        "universe loaded"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dca_core::types::PricePoint;

    struct StaticSource;

    #[async_trait]
    impl HistorySource for StaticSource {
        async fn load_history(
            &self,
            symbol: &str,
            _since: Option<DateTime<Utc>>,
        ) -> Result<PriceSeries, DataError> {
            if symbol == "BAD" {
                return Err(DataError::ParseError("corrupt row".to_string()));
            }
            PriceSeries::from_points(
                symbol,
                vec![PricePoint::new(0, 1.0, 1.0), PricePoint::new(1, 2.0, 1.0)],
            )
        }

        async fn load_metadata(&self, symbol: &str) -> Result<MarketMetadata, DataError> {
            if symbol == "ETH" {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            Ok(MarketMetadata::with_volume_24h(1.0))
        }

        fn name(&self) -> &str {
            "Static"
        }
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let symbols: Vec<String> = ["BTC", "BAD", "ETH"].iter().map(|s| s.to_string()).collect();
        let report = load_histories(&StaticSource, &symbols, None, 2).await;

        assert_eq!(report.symbols(), vec!["BTC", "ETH"]);
        assert!(matches!(report.failures["BAD"], DataError::ParseError(_)));
        assert_eq!(report.metadata.len(), 1);
        assert_eq!(report.metadata["BTC"].volume_24h, Some(1.0));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_loads() {
        let symbols = vec!["BTC".to_string()];
        let report = load_histories(&StaticSource, &symbols, None, 0).await;
        assert!(!report.is_empty());
    }
}
