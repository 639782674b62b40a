use async_trait::async_trait;

use super::CalculatedIndicator;
use crate::error::MetricError;
use crate::models::{DataPoint, TimeSeries};
use crate::pipeline::align::align_rows;

/// SOFR minus the effective fed funds rate, in basis points. A persistently
/// positive print means secured funding is pricing above the policy rate:
/// collateral scarcity or repo stress.
pub struct LiquidityStress;

#[async_trait]
impl CalculatedIndicator for LiquidityStress {
    fn slug(&self) -> &str {
        "Liquidity_Stress"
    }

    fn name(&self) -> &str {
        "Liquidity Stress (SOFR - Fed Funds)"
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec!["SOFR", "Fed_Funds"]
    }

    async fn calculate(&self, inputs: Vec<TimeSeries>) -> Result<TimeSeries, MetricError> {
        if inputs.len() < 2 {
            return Err(MetricError::MissingInput {
                metric: self.slug().to_string(),
                input: "SOFR, Fed_Funds".to_string(),
            });
        }

        let rows = align_rows(&[&inputs[0], &inputs[1]]);
        if rows.is_empty() {
            return Err(MetricError::NoOverlap {
                metric: self.slug().to_string(),
            });
        }

        // percentage points -> basis points
        let points = rows
            .into_iter()
            .map(|r| DataPoint {
                timestamp: r.timestamp,
                value: (r.values[0] - r.values[1]) * 100.0,
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
    async fn spread_is_scaled_to_basis_points() {
        let sofr = TimeSeries::from_points(vec![dp(1, 3.0)]);
        let effr = TimeSeries::from_points(vec![dp(1, 1.0)]);

        let result = LiquidityStress.calculate(vec![sofr, effr]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!((result.latest().unwrap().value - 200.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn spread_uses_only_common_days() {
        let sofr = TimeSeries::from_points(vec![dp(1, 5.31), dp(2, 5.32)]);
        let effr = TimeSeries::from_points(vec![dp(2, 5.33), dp(3, 5.33)]);

        let result = LiquidityStress.calculate(vec![sofr, effr]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!((result.latest().unwrap().value - (5.32 - 5.33) * 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn disjoint_inputs_are_an_error() {
        let sofr = TimeSeries::from_points(vec![dp(1, 5.31)]);
        let effr = TimeSeries::from_points(vec![dp(2, 5.33)]);

        let result = LiquidityStress.calculate(vec![sofr, effr]).await;
        assert!(matches!(result, Err(MetricError::NoOverlap { .. })));
    }
}
