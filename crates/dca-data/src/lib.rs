//! Data collaborators for the DCA engine.
//!
//! Everything that touches the filesystem lives here: CSV price histories, JSON
//! persistence of allocations, snapshots and execution records, and bounded concurrent
//! loading of a universe.

mod cache;
mod csv_source;
mod loader;
mod store;

pub use cache::HistoryCache;
pub use csv_source::CsvHistorySource;
pub use loader::{load_histories, LoadReport};
pub use store::{load_json, save_json, JsonSnapshotSource, JsonStore};

use dca_core::error::DataError;
use dca_core::types::PriceSeries;

/// Load one symbol's history from a CSV directory.
pub async fn load_csv(dir: &str, symbol: &str) -> Result<PriceSeries, DataError> {
    use dca_core::traits::HistorySource;

    let source = CsvHistorySource::new(dir)?;
    source.load_history(symbol, None).await
}
