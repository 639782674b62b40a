use async_trait::async_trait;

use super::CalculatedIndicator;
use crate::error::MetricError;
use crate::models::{DataPoint, TimeSeries};
use crate::pipeline::align::align_rows;

/// Gold priced in barrels of oil. Rising while both rally is the classic
/// monetary-debasement read; rows with a zero divisor are skipped.
pub struct GoldOilRatio;

/// Copper over gold, scaled x1000 for readability. Growth proxy against the
/// safe-haven bid.
pub struct CopperGoldRatio;

fn ratio_series(
    metric: &str,
    inputs: &[TimeSeries],
    scale: f64,
) -> Result<TimeSeries, MetricError> {
    if inputs.len() < 2 {
        return Err(MetricError::MissingInput {
            metric: metric.to_string(),
            input: "numerator, denominator".to_string(),
        });
    }

    let rows = align_rows(&[&inputs[0], &inputs[1]]);
    if rows.is_empty() {
        return Err(MetricError::NoOverlap {
            metric: metric.to_string(),
        });
    }

    let points = rows
        .into_iter()
        .filter_map(|r| {
            if r.values[1] == 0.0 {
                return None;
            }
            Some(DataPoint {
                timestamp: r.timestamp,
                value: r.values[0] / r.values[1] * scale,
            })
        })
        .collect();

    Ok(TimeSeries::from_points(points))
}

#[async_trait]
impl CalculatedIndicator for GoldOilRatio {
    fn slug(&self) -> &str {
        "Gold_Oil"
    }

    fn name(&self) -> &str {
        "Gold/Oil Ratio"
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec!["Gold", "Oil"]
    }

    async fn calculate(&self, inputs: Vec<TimeSeries>) -> Result<TimeSeries, MetricError> {
        ratio_series(self.slug(), &inputs, 1.0)
    }
}

#[async_trait]
impl CalculatedIndicator for CopperGoldRatio {
    fn slug(&self) -> &str {
        "Copper_Gold"
    }

    fn name(&self) -> &str {
        "Copper/Gold Ratio"
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec!["Copper", "Gold"]
    }

    async fn calculate(&self, inputs: Vec<TimeSeries>) -> Result<TimeSeries, MetricError> {
        ratio_series(self.slug(), &inputs, 1000.0)
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
    async fn gold_oil_divides_on_common_days() {
        let gold = TimeSeries::from_points(vec![dp(1, 100.0)]);
        let oil = TimeSeries::from_points(vec![dp(1, 50.0)]);

        let result = GoldOilRatio.calculate(vec![gold, oil]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!((result.latest().unwrap().value - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn zero_divisor_rows_are_skipped() {
        let gold = TimeSeries::from_points(vec![dp(1, 100.0), dp(2, 110.0)]);
        let oil = TimeSeries::from_points(vec![dp(1, 0.0), dp(2, 55.0)]);

        let result = GoldOilRatio.calculate(vec![gold, oil]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!((result.latest().unwrap().value - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn copper_gold_is_scaled() {
        let copper = TimeSeries::from_points(vec![dp(1, 4.5)]);
        let gold = TimeSeries::from_points(vec![dp(1, 3000.0)]);

        let result = CopperGoldRatio.calculate(vec![copper, gold]).await.unwrap();
        assert!((result.latest().unwrap().value - 1.5).abs() < 1e-9);
    }
}
