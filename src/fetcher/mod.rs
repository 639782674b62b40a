use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{SeriesKey, SourceSpec, TimeSeries};

pub mod fred;
pub mod market;

/// One external source system. Implementations own their HTTP client and
/// normalize responses into clean [`TimeSeries`] values.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, spec: &SourceSpec) -> Result<TimeSeries, FetchError>;

    /// Fetch several specs in one round trip where the backend supports it.
    /// The outer error means the whole round trip failed; per-spec errors
    /// stay isolated. The default falls back to serial per-spec calls.
    async fn fetch_batch(
        &self,
        specs: &[SourceSpec],
    ) -> Result<Vec<(SeriesKey, Result<TimeSeries, FetchError>)>, FetchError> {
        let mut out = Vec::with_capacity(specs.len());
        for spec in specs {
            out.push((spec.key.clone(), self.fetch(spec).await));
        }
        Ok(out)
    }
}
