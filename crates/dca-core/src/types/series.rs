//! Price history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// One daily observation of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: f64,
}

impl PricePoint {
    /// Create a new observation.
    pub fn new(timestamp: i64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            close,
            volume,
        }
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Ordered price/volume history for one asset.
///
/// Timestamps are strictly increasing. Gaps are allowed and are never interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Symbol identifier
    pub symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create an empty series.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
        }
    }

    /// Build a series from observations, rejecting non-increasing timestamps.
    pub fn from_points(
        symbol: impl Into<String>,
        points: Vec<PricePoint>,
    ) -> Result<Self, DataError> {
        let mut series = Self::new(symbol);
        series.points.reserve(points.len());
        for point in points {
            series.push(point)?;
        }
        Ok(series)
    }

    /// Append an observation. Its timestamp must be later than the last one.
    pub fn push(&mut self, point: PricePoint) -> Result<(), DataError> {
        if let Some(last) = self.points.last() {
            if point.timestamp <= last.timestamp {
                return Err(DataError::NonMonotonicTimestamps {
                    symbol: self.symbol.clone(),
                    timestamp: point.timestamp,
                });
            }
        }
        self.points.push(point);
        Ok(())
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All observations, oldest first.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// First observation.
    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Extract volumes as a vector.
    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volume).collect()
    }

    /// Extract timestamps as a vector.
    pub fn timestamps(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// Close price at an exact timestamp.
    pub fn close_at(&self, timestamp: i64) -> Option<f64> {
        self.points
            .binary_search_by_key(&timestamp, |p| p.timestamp)
            .ok()
            .map(|idx| self.points[idx].close)
    }

    /// Most recent close at or before a timestamp.
    pub fn close_as_of(&self, timestamp: i64) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.timestamp <= timestamp);
        idx.checked_sub(1).map(|i| self.points[i].close)
    }

    /// Keep only observations at or after `cutoff` (Unix milliseconds).
    pub fn since(&self, cutoff: i64) -> PriceSeries {
        let start = self.points.partition_point(|p| p.timestamp < cutoff);
        Self {
            symbol: self.symbol.clone(),
            points: self.points[start..].to_vec(),
        }
    }

    /// Keep only observations at or before `end` (Unix milliseconds).
    pub fn until(&self, end: i64) -> PriceSeries {
        let stop = self.points.partition_point(|p| p.timestamp <= end);
        Self {
            symbol: self.symbol.clone(),
            points: self.points[..stop].to_vec(),
        }
    }

    /// Get an iterator over the observations.
    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400_000;

    fn series() -> PriceSeries {
        PriceSeries::from_points(
            "BTC",
            vec![
                PricePoint::new(DAY, 100.0, 10.0),
                PricePoint::new(2 * DAY, 110.0, 20.0),
                PricePoint::new(4 * DAY, 121.0, 30.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_increasing_timestamps() {
        let result = PriceSeries::from_points(
            "BTC",
            vec![PricePoint::new(2, 1.0, 1.0), PricePoint::new(2, 1.0, 1.0)],
        );
        assert!(matches!(
            result,
            Err(DataError::NonMonotonicTimestamps { timestamp: 2, .. })
        ));
    }

    #[test]
    fn test_extractions() {
        let s = series();
        assert_eq!(s.closes(), vec![100.0, 110.0, 121.0]);
        assert_eq!(s.volumes(), vec![10.0, 20.0, 30.0]);
        assert_eq!(s.timestamps(), vec![DAY, 2 * DAY, 4 * DAY]);
    }

    #[test]
    fn test_lookups_tolerate_gaps() {
        let s = series();
        assert_eq!(s.close_at(2 * DAY), Some(110.0));
        assert_eq!(s.close_at(3 * DAY), None);
        assert_eq!(s.close_as_of(3 * DAY), Some(110.0));
        assert_eq!(s.close_as_of(0), None);
    }

    #[test]
    fn test_window_trimming() {
        let s = series();
        assert_eq!(s.since(2 * DAY).len(), 2);
        assert_eq!(s.until(2 * DAY).len(), 2);
        assert!(s.since(5 * DAY).is_empty());
    }
}
