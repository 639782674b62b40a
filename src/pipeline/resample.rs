use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::{DataPoint, TimeSeries};

const DAY: i64 = 86_400;

/// Reindex a series to daily cadence at UTC midnight.
///
/// Observations are collapsed to one per day (last one wins). Gaps of at
/// most `gap_limit` consecutive missing days are filled by time-weighted
/// linear interpolation between the surrounding observations; longer gaps
/// stay unfilled. Weekly and business-day-only series come out daily without
/// fabricating data across long reporting blackouts.
pub fn resample_daily(series: &TimeSeries, gap_limit: u32) -> TimeSeries {
    let mut daily: BTreeMap<i64, f64> = BTreeMap::new();
    for p in series.iter() {
        daily.insert(p.timestamp.timestamp().div_euclid(DAY), p.value);
    }

    let mut out = Vec::with_capacity(daily.len());
    let mut prev: Option<(i64, f64)> = None;
    for (&day, &value) in &daily {
        if let Some((prev_day, prev_value)) = prev {
            let gap = day - prev_day - 1;
            if gap > 0 && gap <= i64::from(gap_limit) {
                for missing in (prev_day + 1)..day {
                    let frac = (missing - prev_day) as f64 / (day - prev_day) as f64;
                    out.push(day_point(missing, prev_value + (value - prev_value) * frac));
                }
            }
        }
        out.push(day_point(day, value));
        prev = Some((day, value));
    }

    TimeSeries::from_points(out)
}

fn day_point(day: i64, value: f64) -> DataPoint {
    DataPoint {
        timestamp: DateTime::from_timestamp(day * DAY, 0).unwrap_or_default(),
        value,
    }
}
