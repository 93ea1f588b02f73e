//! JSON persistence for allocations, snapshots, state and execution records.

use async_trait::async_trait;
use dca_core::error::DataError;
use dca_core::traits::SnapshotSource;
use dca_core::types::{PortfolioSnapshot, PortfolioState};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const STATE_DIR: &str = "state";
const SNAPSHOT_DIR: &str = "snapshots";

/// Write a value as pretty JSON.
///
/// The file is written next to its destination and renamed into place, so readers never
/// observe a partial document.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "saved json");
    Ok(())
}

/// Read a JSON document.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DataError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&content)?)
}

/// Directory of JSON documents grouped by kind.
///
/// Layout: `{dir}/{kind}/{id}.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a record.
    pub fn record_path(&self, kind: &str, id: &str) -> PathBuf {
        self.dir.join(kind).join(format!("{id}.json"))
    }

    pub fn save_record<T: Serialize>(&self, kind: &str, id: &str, value: &T) -> Result<(), DataError> {
        save_json(self.record_path(kind, id), value)
    }

    /// Load a record, mapping a missing file to `SymbolNotFound` with the record id.
    pub fn load_record<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<T, DataError> {
        let path = self.record_path(kind, id);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound(format!("{kind}/{id}")));
        }
        load_json(path)
    }

    /// Ids of the records of a kind, sorted.
    pub fn list_records(&self, kind: &str) -> Result<Vec<String>, DataError> {
        let dir = self.dir.join(kind);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn save_state(&self, state: &PortfolioState) -> Result<(), DataError> {
        self.save_record(STATE_DIR, &state.portfolio_id, state)
    }

    pub fn load_state(&self, portfolio_id: &str) -> Result<PortfolioState, DataError> {
        self.load_record(STATE_DIR, portfolio_id)
    }

    pub fn save_snapshot(
        &self,
        portfolio_id: &str,
        snapshot: &PortfolioSnapshot,
    ) -> Result<(), DataError> {
        self.save_record(SNAPSHOT_DIR, portfolio_id, snapshot)
    }

    pub fn load_snapshot(&self, portfolio_id: &str) -> Result<PortfolioSnapshot, DataError> {
        self.load_record(SNAPSHOT_DIR, portfolio_id)
    }
}

/// Snapshot provider backed by a [`JsonStore`].
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    store: JsonStore,
}

impl JsonSnapshotSource {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SnapshotSource for JsonSnapshotSource {
    async fn snapshot(&self, portfolio_id: &str) -> Result<PortfolioSnapshot, DataError> {
        let path = self.store.record_path(SNAPSHOT_DIR, portfolio_id);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DataError::SymbolNotFound(format!("{SNAPSHOT_DIR}/{portfolio_id}"))
            } else {
                DataError::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn name(&self) -> &str {
        "JSON Snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dca_core::types::TargetAllocation;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn create_snapshot() -> PortfolioSnapshot {
        let holdings = BTreeMap::from([("BTC".to_string(), dec!(0.1)), ("ETH".to_string(), dec!(2))]);
        let prices = BTreeMap::from([
            ("BTC".to_string(), dec!(50000)),
            ("ETH".to_string(), dec!(2500)),
        ]);
        PortfolioSnapshot::from_holdings(&holdings, &prices, dec!(0), DateTime::<Utc>::UNIX_EPOCH)
            .unwrap()
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("target.json");
        let target: TargetAllocation = [("BTC".to_string(), 0.6), ("ETH".to_string(), 0.4)]
            .into_iter()
            .collect();

        save_json(&path, &target).unwrap();
        let restored: TargetAllocation = load_json(&path).unwrap();

        assert_eq!(restored, target);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let target: TargetAllocation = [("BTC".to_string(), 1.0)].into_iter().collect();
        let state = PortfolioState::new("main", target, DateTime::<Utc>::UNIX_EPOCH);

        store.save_state(&state).unwrap();
        assert_eq!(store.load_state("main").unwrap(), state);
        assert!(matches!(
            store.load_state("other"),
            Err(DataError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn test_list_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        store.save_record("executions", "b", &1).unwrap();
        store.save_record("executions", "a", &2).unwrap();

        assert_eq!(store.list_records("executions").unwrap(), vec!["a", "b"]);
        assert!(store.list_records("missing").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let snapshot = create_snapshot();
        store.save_snapshot("main", &snapshot).unwrap();

        let source = JsonSnapshotSource::new(store);
        assert_eq!(source.snapshot("main").await.unwrap(), snapshot);
        assert!(matches!(
            source.snapshot("absent").await,
            Err(DataError::SymbolNotFound(_))
        ));
    }
}
