//! CLI command implementations.

pub mod backtest;
pub mod check;
pub mod optimize;
pub mod plan;
pub mod presets;
pub mod validate;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use dca_config::{load_config, AppConfig, DataSettings};
use dca_core::traits::SnapshotSource;
use dca_core::types::{PortfolioSnapshot, PortfolioState};
use dca_data::{load_histories, CsvHistorySource, HistoryCache, JsonSnapshotSource, JsonStore, LoadReport};
use std::path::Path;
use tracing::{debug, info, warn};

/// Load and validate the configuration, falling back to defaults when the file is absent.
pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "configuration file not found, using defaults");
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    }
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Load the histories of a universe.
///
/// Symbols come from the command line, then the configured universe, then every CSV in
/// the data directory. With `lookback` the configured window is applied to each series.
pub async fn load_universe(
    data: &DataSettings,
    symbols: &[String],
    lookback: bool,
) -> Result<LoadReport> {
    if !data.dir.exists() {
        anyhow::bail!(
            "Data directory '{}' does not exist. Set data.dir or DCA__DATA__DIR to a directory of CSV files",
            data.dir.display()
        );
    }

    let mut source = CsvHistorySource::new(&data.dir)
        .with_context(|| format!("Failed to open data directory {}", data.dir.display()))?;
    if lookback {
        source = source.with_lookback_days(data.lookback_days);
    }

    let symbols: Vec<String> = if !symbols.is_empty() {
        symbols.iter().map(|s| s.to_uppercase()).collect()
    } else if !data.universe.is_empty() {
        data.universe.iter().map(|s| s.to_uppercase()).collect()
    } else {
        source.list_symbols()?
    };
    if symbols.is_empty() {
        anyhow::bail!("No symbols to load from {}", data.dir.display());
    }

    let cache = HistoryCache::new(source);
    let report = load_histories(&cache, &symbols, None, data.max_concurrent_loads).await;
    debug!(cached = cache.len(), misses = cache.misses(), "history cache");

    if report.is_empty() {
        anyhow::bail!("No data loaded");
    }
    info!("Loaded data for {} symbols", report.histories.len());
    Ok(report)
}

/// State store for the configured state directory.
pub fn open_store(data: &DataSettings) -> JsonStore {
    JsonStore::new(&data.state_dir)
}

/// Load a portfolio's state and a snapshot that is fresh enough to act on.
pub async fn load_portfolio(
    config: &AppConfig,
    portfolio_id: &str,
    now: DateTime<Utc>,
) -> Result<(PortfolioState, PortfolioSnapshot)> {
    let store = open_store(&config.data);
    let state = store.load_state(portfolio_id).with_context(|| {
        format!("No state for portfolio '{portfolio_id}'. Run `dca optimize --save` first")
    })?;

    let source = JsonSnapshotSource::new(store);
    let snapshot = source
        .snapshot(portfolio_id)
        .await
        .with_context(|| format!("No snapshot for portfolio '{portfolio_id}'"))?;

    let max_age = Duration::hours(config.data.max_snapshot_age_hours);
    if snapshot.is_stale(now, max_age) {
        anyhow::bail!(
            "Snapshot for '{}' is {} hours old (limit {} hours); refresh it before rebalancing",
            portfolio_id,
            snapshot.age(now).num_hours(),
            config.data.max_snapshot_age_hours
        );
    }

    Ok((state, snapshot))
}
