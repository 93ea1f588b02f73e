//! History caching.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dca_core::error::DataError;
use dca_core::traits::HistorySource;
use dca_core::types::{MarketMetadata, PriceSeries};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::trace;

/// In-memory cache in front of another history source.
///
/// Full series are cached per symbol; the `since` filter is applied on the way out so one
/// entry serves every window.
pub struct HistoryCache<S> {
    inner: S,
    cache: RwLock<HashMap<String, PriceSeries>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: HistorySource> HistoryCache<S> {
    /// Create a new cache over a source.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Generate cache key.
    fn cache_key(symbol: &str) -> String {
        symbol.to_uppercase()
    }

    /// Get a cached series.
    pub fn get(&self, symbol: &str) -> Option<PriceSeries> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(&Self::cache_key(symbol)).cloned()
    }

    /// Store a series in the cache.
    pub fn put(&self, series: PriceSeries) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(Self::cache_key(&series.symbol), series);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.contains_key(&Self::cache_key(symbol))
    }

    /// Clear the cache for a symbol.
    pub fn clear(&self, symbol: &str) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.remove(&Self::cache_key(symbol));
    }

    /// Clear all cached data.
    pub fn clear_all(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of loads answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of loads passed through to the inner source.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get the wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Return the cached series, loading and caching it on a miss.
    pub async fn get_or_load(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        if let Some(series) = self.get(symbol) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(symbol, "history cache hit");
            return Ok(series);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let series = self.inner.load_history(symbol, None).await?;
        self.put(series.clone());
        Ok(series)
    }
}

#[async_trait]
impl<S: HistorySource> HistorySource for HistoryCache<S> {
    async fn load_history(
        &self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<PriceSeries, DataError> {
        let series = self.get_or_load(symbol).await?;
        match since {
            Some(since) => {
                let trimmed = series.since(since.timestamp_millis());
                if trimmed.is_empty() {
                    return Err(DataError::NoDataAvailable);
                }
                Ok(trimmed)
            }
            None => Ok(series),
        }
    }

    async fn load_metadata(&self, symbol: &str) -> Result<MarketMetadata, DataError> {
        self.inner.load_metadata(symbol).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_core::types::PricePoint;
    use std::sync::atomic::AtomicUsize;

    struct CountingSource {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl HistorySource for CountingSource {
        async fn load_history(
            &self,
            symbol: &str,
            _since: Option<DateTime<Utc>>,
        ) -> Result<PriceSeries, DataError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if symbol.eq_ignore_ascii_case("missing") {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            let points = (0..5)
                .map(|i| PricePoint::new(i * 86_400_000, 100.0 + i as f64, 1.0))
                .collect();
            PriceSeries::from_points(symbol.to_uppercase(), points)
        }

        fn name(&self) -> &str {
            "Counting"
        }
    }

    fn create_cache() -> HistoryCache<CountingSource> {
        HistoryCache::new(CountingSource {
            loads: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_second_load_is_a_hit() {
        let cache = create_cache();
        cache.load_history("BTC", None).await.unwrap();
        cache.load_history("btc", None).await.unwrap();

        assert_eq!(cache.inner().loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert!(cache.contains("BTC"));
    }

    #[tokio::test]
    async fn test_since_applied_to_cached_series() {
        let cache = create_cache();
        let since = DateTime::from_timestamp(3 * 86_400, 0).unwrap();
        let series = cache.load_history("ETH", Some(since)).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(cache.get("ETH").unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let cache = create_cache();
        assert!(cache.load_history("missing", None).await.is_err());
        assert!(cache.load_history("missing", None).await.is_err());
        assert_eq!(cache.inner().loads.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = create_cache();
        cache.load_history("BTC", None).await.unwrap();
        cache.load_history("ETH", None).await.unwrap();
        cache.clear("btc");
        assert_eq!(cache.len(), 1);
        cache.clear_all();
        assert!(cache.is_empty());
    }
}
