//! CSV price history source.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use dca_core::error::DataError;
use dca_core::traits::HistorySource;
use dca_core::types::{MarketMetadata, PricePoint, PriceSeries};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File holding optional per-symbol metadata next to the CSV files.
const METADATA_FILE: &str = "metadata.json";

/// File name suffixes tried after the bare symbol.
const FILE_SUFFIXES: [&str; 3] = ["", "_daily", "_historical_data"];

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "timestamp",
        alias = "Timestamp",
        alias = "time",
        alias = "open_time"
    )]
    date: String,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close", alias = "price")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Reads one CSV file per symbol from a directory.
///
/// A symbol resolves to the first existing file among `{SYMBOL}.csv`, `{symbol}.csv`,
/// `{SYMBOL}_daily.csv` and `{SYMBOL}_historical_data.csv` (and their lower-case forms).
pub struct CsvHistorySource {
    dir: PathBuf,
    lookback_days: Option<i64>,
}

impl CsvHistorySource {
    /// Create a new CSV history source over a directory.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, DataError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            lookback_days: None,
        })
    }

    /// Keep only the trailing `days` of each series, measured from its last observation.
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Get the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate the file for a symbol.
    fn resolve_path(&self, symbol: &str) -> Result<PathBuf, DataError> {
        let upper = symbol.to_uppercase();
        let lower = symbol.to_lowercase();
        for suffix in FILE_SUFFIXES {
            for name in [&upper, &lower] {
                let path = self.dir.join(format!("{name}{suffix}.csv"));
                if path.is_file() {
                    return Ok(path);
                }
            }
        }
        Err(DataError::SymbolNotFound(symbol.to_string()))
    }

    /// Symbols with a CSV file in the directory, upper-cased and sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, DataError> {
        let mut symbols = BTreeSet::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let symbol = FILE_SUFFIXES
                .iter()
                .rev()
                .filter(|suffix| !suffix.is_empty())
                .find_map(|suffix| stem.strip_suffix(suffix))
                .unwrap_or(stem);
            symbols.insert(symbol.to_uppercase());
        }
        Ok(symbols.into_iter().collect())
    }

    /// Load a series from a specific path.
    fn load_from_path(&self, symbol: &str, path: &Path) -> Result<PriceSeries, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut points = Vec::new();

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

            if !record.close.is_finite() {
                return Err(DataError::ParseError(format!(
                    "{}: non-finite close on {}",
                    symbol, record.date
                )));
            }

            let timestamp = parse_timestamp(&record.date)?;
            let volume = if record.volume.is_finite() {
                record.volume
            } else {
                0.0
            };
            points.push(PricePoint::new(timestamp, record.close, volume));
        }

        // Sort by timestamp; duplicates are rejected by the series itself
        points.sort_by_key(|p| p.timestamp);

        PriceSeries::from_points(symbol.to_uppercase(), points)
    }

    fn read_metadata(&self) -> Result<BTreeMap<String, MarketMetadata>, DataError> {
        let path = self.dir.join(METADATA_FILE);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        let raw: BTreeMap<String, MarketMetadata> = serde_json::from_str(&content)?;
        Ok(raw
            .into_iter()
            .map(|(symbol, meta)| (symbol.to_uppercase(), meta))
            .collect())
    }
}

#[async_trait]
impl HistorySource for CsvHistorySource {
    async fn load_history(
        &self,
        symbol: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<PriceSeries, DataError> {
        let path = self.resolve_path(symbol)?;
        let mut series = self.load_from_path(symbol, &path)?;

        if let (Some(days), Some(last)) = (self.lookback_days, series.last()) {
            let cutoff = last.timestamp - Duration::days(days).num_milliseconds();
            series = series.since(cutoff);
        }
        if let Some(since) = since {
            series = series.since(since.timestamp_millis());
        }

        debug!(symbol, points = series.len(), path = %path.display(), "loaded history");

        if series.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(series)
    }

    async fn load_metadata(&self, symbol: &str) -> Result<MarketMetadata, DataError> {
        Ok(self
            .read_metadata()?
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

/// Parse various timestamp formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    let formats = [
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d-%m-%Y",
    ];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    // Unix timestamp; assume milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        if ts > 10_000_000_000 {
            return Ok(ts);
        } else {
            return Ok(ts * 1000);
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
