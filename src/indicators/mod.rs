use async_trait::async_trait;

use crate::error::MetricError;
use crate::models::TimeSeries;

pub mod net_liquidity;
pub mod ratio;
pub mod registry;
pub mod spread;

/// A series computed from other series after a run's fetches have settled.
#[async_trait]
pub trait CalculatedIndicator {
    /// Key the result is stored under (e.g., "Net_Liquidity").
    fn slug(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Keys of the input series, in the order `calculate` expects them.
    fn required_inputs(&self) -> Vec<&str>;

    /// Compute the indicator from its inputs. Inputs are aligned on the
    /// full intersection of their timestamps before any arithmetic.
    async fn calculate(&self, inputs: Vec<TimeSeries>) -> Result<TimeSeries, MetricError>;
}
