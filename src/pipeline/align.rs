use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::{DataPoint, TimeSeries};

/// One timestamp shared by every aligned input, values in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// Inner-join any number of series on their timestamp index.
///
/// A row is emitted only for timestamps present in every input, so the
/// result is the full N-way intersection. Multi-series arithmetic must go
/// through this once, up front: chaining pairwise joins can smuggle in
/// timestamps missing from a later operand.
pub fn align_rows(series: &[&TimeSeries]) -> Vec<AlignedRow> {
    let Some((first, rest)) = series.split_first() else {
        return Vec::new();
    };
    let maps: Vec<BTreeMap<DateTime<Utc>, f64>> = rest
        .iter()
        .map(|s| s.iter().map(|p| (p.timestamp, p.value)).collect())
        .collect();

    let mut rows = Vec::new();
    'next_point: for p in first.iter() {
        let mut values = Vec::with_capacity(series.len());
        values.push(p.value);
        for map in &maps {
            match map.get(&p.timestamp) {
                Some(v) => values.push(*v),
                None => continue 'next_point,
            }
        }
        rows.push(AlignedRow {
            timestamp: p.timestamp,
            values,
        });
    }
    rows
}

/// Restrict two series to their common timestamps.
pub fn align(a: &TimeSeries, b: &TimeSeries) -> (TimeSeries, TimeSeries) {
    let rows = align_rows(&[a, b]);
    let pick = |idx: usize| {
        TimeSeries::from_points(
            rows.iter()
                .map(|r| DataPoint {
                    timestamp: r.timestamp,
                    value: r.values[idx],
                })
                .collect(),
        )
    };
    (pick(0), pick(1))
}
