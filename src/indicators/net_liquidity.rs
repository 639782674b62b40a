use async_trait::async_trait;

use super::CalculatedIndicator;
use crate::error::MetricError;
use crate::models::{DataPoint, TimeSeries};
use crate::pipeline::align::align_rows;

/// Net Liquidity = Fed balance sheet - TGA - overnight RRP, in dollars.
///
/// The three inputs publish on different calendars, so the intersection is
/// taken across all three at once; aligning two and then subtracting the
/// third on a different index would quietly mix calendars.
pub struct NetLiquidity;

// UNIT CORRECTION:
// WALCL (Fed assets) and WTREGEN (TGA) are reported in millions of dollars,
// RRPONTSYD (RRP) in billions. Everything is converted to dollars before
// differencing.
const MILLIONS: f64 = 1_000_000.0;
const BILLIONS: f64 = 1_000_000_000.0;

#[async_trait]
impl CalculatedIndicator for NetLiquidity {
    fn slug(&self) -> &str {
        "Net_Liquidity"
    }

    fn name(&self) -> &str {
        "Net Liquidity (Fed BS - TGA - RRP)"
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec!["Fed_BS", "TGA", "ON_RRP"]
    }

    async fn calculate(&self, inputs: Vec<TimeSeries>) -> Result<TimeSeries, MetricError> {
        if inputs.len() < 3 {
            return Err(MetricError::MissingInput {
                metric: self.slug().to_string(),
                input: "Fed_BS, TGA, ON_RRP".to_string(),
            });
        }

        let rows = align_rows(&[&inputs[0], &inputs[1], &inputs[2]]);
        if rows.is_empty() {
            return Err(MetricError::NoOverlap {
                metric: self.slug().to_string(),
            });
        }

        let points = rows
            .into_iter()
            .map(|r| {
                let fed = r.values[0] * MILLIONS;
                let tga = r.values[1] * MILLIONS;
                let rrp = r.values[2] * BILLIONS;
                DataPoint {
                    timestamp: r.timestamp,
                    value: fed - tga - rrp,
                }
            })
            .collect();

        Ok(TimeSeries::from_points(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dp(day: u32, value: f64) -> DataPoint {
        DataPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            value,
        }
    }

    #[tokio::test]
    async fn subtracts_in_dollars() {
        let fed = TimeSeries::from_points(vec![dp(1, 9_000_000.0)]); // $9T in millions
        let tga = TimeSeries::from_points(vec![dp(1, 700_000.0)]); // $0.7T in millions
        let rrp = TimeSeries::from_points(vec![dp(1, 2_000.0)]); // $2T in billions

        let result = NetLiquidity.calculate(vec![fed, tga, rrp]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!((result.latest().unwrap().value - 6.3e12).abs() < 1.0);
    }

    #[tokio::test]
    async fn restricts_to_the_three_way_overlap() {
        // five days each, but only days 3 and 4 appear in all three
        let fed = TimeSeries::from_points((1..=5).map(|d| dp(d, 9_000_000.0)).collect());
        let tga = TimeSeries::from_points((3..=7).map(|d| dp(d, 700_000.0)).collect());
        let rrp = TimeSeries::from_points(vec![dp(2, 2_000.0), dp(3, 2_000.0), dp(4, 2_000.0), dp(8, 2_000.0), dp(9, 2_000.0)]);

        let result = NetLiquidity.calculate(vec![fed, tga, rrp]).await.unwrap();
        assert_eq!(result.len(), 2);
        let days: Vec<_> = result.iter().map(|p| p.timestamp).collect();
        assert_eq!(days, vec![dp(3, 0.0).timestamp, dp(4, 0.0).timestamp]);
    }

    #[tokio::test]
    async fn disjoint_calendars_are_an_error() {
        let fed = TimeSeries::from_points(vec![dp(1, 1.0)]);
        let tga = TimeSeries::from_points(vec![dp(2, 1.0)]);
        let rrp = TimeSeries::from_points(vec![dp(3, 1.0)]);

        let result = NetLiquidity.calculate(vec![fed, tga, rrp]).await;
        assert!(matches!(result, Err(MetricError::NoOverlap { .. })));
    }
}
