use crate::models::TimeSeries;

/// How many trailing points must be identical before the tail is treated as
/// a frozen feed. Load-bearing: loosening or tightening this changes which
/// series get truncated.
pub const STALE_TAIL_WINDOW: usize = 5;

/// Drop a constant-valued trailing run that looks like a feed that stopped
/// updating but kept emitting its last close.
///
/// If the final `window` values are all identical (zero sample variance),
/// the series is cut back to the most recent point whose value differs from
/// the flat value. A series with no such earlier point may be legitimately
/// constant and is left untouched. A genuinely flat market over the window
/// is indistinguishable from a stalled feed and gets truncated too; that
/// false positive is the accepted cost of never showing a frozen reading as
/// current.
pub fn trim_stale_tail(mut series: TimeSeries, window: usize) -> TimeSeries {
    if window == 0 || series.len() <= window {
        return series;
    }

    let points = series.points();
    let tail = &points[points.len() - window..];
    let flat = tail[window - 1].value;
    if !tail.iter().all(|p| p.value == flat) {
        return series;
    }

    match points.iter().rposition(|p| p.value != flat) {
        Some(last_live) => {
            series.truncate(last_live + 1);
            series
        }
        None => series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;
    use chrono::{TimeZone, Utc};

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, &value)| DataPoint {
                    timestamp: Utc.with_ymd_and_hms(2024, 1, 1 + i as u32, 0, 0, 0).unwrap(),
                    value,
                })
                .collect(),
        )
    }

    fn values(series: &TimeSeries) -> Vec<f64> {
        series.iter().map(|p| p.value).collect()
    }

    #[test]
    fn frozen_tail_is_cut_back_to_last_live_point() {
        let out = trim_stale_tail(series(&[1.0, 2.0, 3.0, 5.0, 5.0, 5.0, 5.0, 5.0]), 5);
        assert_eq!(values(&out), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn moving_tail_is_untouched() {
        let input = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = trim_stale_tail(input.clone(), 5);
        assert_eq!(out, input);
    }

    #[test]
    fn all_constant_series_is_untouched() {
        let input = series(&[7.0, 7.0, 7.0, 7.0, 7.0, 7.0, 7.0]);
        let out = trim_stale_tail(input.clone(), 5);
        assert_eq!(out, input);
    }

    #[test]
    fn short_series_is_untouched() {
        let input = series(&[5.0, 5.0, 5.0, 5.0, 5.0]);
        let out = trim_stale_tail(input.clone(), 5);
        assert_eq!(out, input);
    }

    #[test]
    fn flat_run_longer_than_window_is_fully_removed() {
        let out = trim_stale_tail(series(&[1.0, 2.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]), 5);
        assert_eq!(values(&out), vec![1.0, 2.0]);
    }
}
