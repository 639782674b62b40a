use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable internal name of a series ("TGA", "Gold", ...); the join key
/// between fetched data, derived metrics, and downstream consumers.
pub type SeriesKey = String;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Which external system a series comes from.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Fred,
    Market,
}

/// Static descriptor of where and what to fetch. Never mutated at runtime.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpec {
    pub source: SourceKind,
    /// External code: a FRED series id or a ticker symbol.
    pub code: String,
    /// Internal key the fetched series is stored under.
    pub key: SeriesKey,
    pub lookback_days: i64,
    /// `Some(n)` resamples to daily cadence, interpolating across gaps of at
    /// most `n` missing days. `None` keeps the source calendar as-is.
    pub gap_limit: Option<u32>,
}

/// An ordered (timestamp, value) sequence.
///
/// Construction enforces the invariants the rest of the pipeline relies on:
/// timestamps strictly increasing with no duplicates (last write wins), and
/// every value finite.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TimeSeries(Vec<DataPoint>);

impl TimeSeries {
    pub fn from_points(points: Vec<DataPoint>) -> Self {
        let by_ts: BTreeMap<DateTime<Utc>, f64> = points
            .into_iter()
            .filter(|p| p.value.is_finite())
            .map(|p| (p.timestamp, p.value))
            .collect();
        TimeSeries(
            by_ts
                .into_iter()
                .map(|(timestamp, value)| DataPoint { timestamp, value })
                .collect(),
        )
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataPoint> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&DataPoint> {
        self.0.first()
    }

    pub fn latest(&self) -> Option<&DataPoint> {
        self.0.last()
    }

    pub fn previous(&self) -> Option<&DataPoint> {
        self.0.len().checked_sub(2).and_then(|i| self.0.get(i))
    }

    /// Percent change of the latest value against the one before it.
    pub fn delta_pct(&self) -> Option<f64> {
        let last = self.latest()?.value;
        let prev = self.previous()?.value;
        if prev == 0.0 {
            return None;
        }
        Some((last - prev) / prev * 100.0)
    }

    /// The last `n` points (fewer if the series is shorter). O(1) slice.
    pub fn tail(&self, n: usize) -> &[DataPoint] {
        &self.0[self.0.len().saturating_sub(n)..]
    }

    /// Drops every point older than `cutoff`.
    pub fn since(mut self, cutoff: DateTime<Utc>) -> Self {
        let split = self.0.partition_point(|p| p.timestamp < cutoff);
        self.0.drain(..split);
        self
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl IntoIterator for TimeSeries {
    type Item = DataPoint;
    type IntoIter = std::vec::IntoIter<DataPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
