use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::FetchError;
use crate::fetcher::fred::FredFetcher;
use crate::fetcher::market::MarketFetcher;
use crate::fetcher::DataSource;
use crate::indicators::registry::Registry;
use crate::models::{SeriesKey, SourceKind, SourceSpec, TimeSeries};
use crate::pipeline::rate_limiter::RateLimiter;
use crate::pipeline::resample::resample_daily;
use crate::pipeline::stale::{trim_stale_tail, STALE_TAIL_WINDOW};

type FetchOutcome = (SeriesKey, Result<TimeSeries, FetchError>);

/// Runs one acquisition: fan out fetches with bounded parallelism, normalize
/// each series, merge, then compute derived metrics over the merged mapping.
///
/// The pipeline is stateless per invocation; callers own caching. A failed
/// series never fails the run: its key is simply absent, and an all-failed
/// run returns an empty mapping, which is a valid result. Fetch futures are
/// polled inside `run` itself, so dropping the returned future cancels
/// whatever is still in flight.
pub struct Orchestrator {
    config: PipelineConfig,
    fred: Arc<dyn DataSource>,
    market: Arc<dyn DataSource>,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        let fred: Arc<dyn DataSource> = Arc::new(FredFetcher::new(
            config.fred_base_url.clone(),
            config.fred_window_start,
            config.fetch_timeout,
        ));
        let market: Arc<dyn DataSource> = Arc::new(MarketFetcher::new(
            config.market_base_url.clone(),
            config.fetch_timeout,
        ));
        Self {
            config,
            fred,
            market,
        }
    }

    /// Same orchestrator with the source systems swapped out.
    pub fn with_sources(
        config: PipelineConfig,
        fred: Arc<dyn DataSource>,
        market: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            config,
            fred,
            market,
        }
    }

    pub async fn run(&self, specs: &[SourceSpec]) -> BTreeMap<SeriesKey, TimeSeries> {
        if specs.is_empty() {
            return BTreeMap::new();
        }

        let (market_specs, other_specs): (Vec<&SourceSpec>, Vec<&SourceSpec>) =
            specs.iter().partition(|s| s.source == SourceKind::Market);

        let mut jobs: Vec<BoxFuture<'_, Vec<FetchOutcome>>> = Vec::new();
        for spec in other_specs {
            jobs.push(Box::pin(self.fetch_single(spec)));
        }
        if self.config.batch_quotes && !market_specs.is_empty() {
            let batch: Vec<SourceSpec> = market_specs.into_iter().cloned().collect();
            jobs.push(Box::pin(self.fetch_market_batch(batch)));
        } else {
            for spec in market_specs {
                jobs.push(Box::pin(self.fetch_single(spec)));
            }
        }

        info!(
            series = specs.len(),
            workers = self.config.workers,
            "starting acquisition run"
        );
        let settled: Vec<Vec<FetchOutcome>> = stream::iter(jobs)
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;

        let mut merged = BTreeMap::new();
        for (key, result) in settled.into_iter().flatten() {
            match result {
                Ok(series) => {
                    merged.insert(key, series);
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "series fetch failed; key omitted from run");
                }
            }
        }

        self.apply_derived(&mut merged).await;
        info!(series = merged.len(), "acquisition run complete");
        merged
    }

    fn source_for(&self, kind: SourceKind) -> &Arc<dyn DataSource> {
        match kind {
            SourceKind::Fred => &self.fred,
            SourceKind::Market => &self.market,
        }
    }

    async fn fetch_single(&self, spec: &SourceSpec) -> Vec<FetchOutcome> {
        RateLimiter::wait(spec.source).await;
        let fetch = self.source_for(spec.source).fetch(spec);
        let result = match timeout(self.config.fetch_timeout, fetch).await {
            Ok(result) => result.map(|series| post_process(spec, series)),
            Err(_) => Err(FetchError::Timeout(self.config.fetch_timeout)),
        };
        vec![(spec.key.clone(), result)]
    }

    async fn fetch_market_batch(&self, specs: Vec<SourceSpec>) -> Vec<FetchOutcome> {
        RateLimiter::wait(SourceKind::Market).await;
        let by_key: HashMap<&str, &SourceSpec> =
            specs.iter().map(|s| (s.key.as_str(), s)).collect();
        match timeout(self.config.fetch_timeout, self.market.fetch_batch(&specs)).await {
            Ok(Ok(results)) => results
                .into_iter()
                .map(|(key, result)| {
                    let result = result.map(|series| match by_key.get(key.as_str()) {
                        Some(spec) => post_process(spec, series),
                        None => series,
                    });
                    (key, result)
                })
                .collect(),
            Ok(Err(err)) => {
                warn!(error = %err, "batched market fetch failed; all tickers omitted from run");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.fetch_timeout,
                    "batched market fetch timed out; all tickers omitted from run"
                );
                Vec::new()
            }
        }
    }

    /// Derived metrics run strictly after every fetch has settled: they read
    /// the merged mapping, and a metric with any missing or non-overlapping
    /// input is skipped, never partially computed.
    async fn apply_derived(&self, merged: &mut BTreeMap<SeriesKey, TimeSeries>) {
        for indicator in Registry::derived_indicators() {
            let required = indicator.required_inputs();
            let inputs: Option<Vec<TimeSeries>> =
                required.iter().map(|key| merged.get(*key).cloned()).collect();
            let Some(inputs) = inputs else {
                debug!(
                    metric = indicator.slug(),
                    "derived metric skipped; inputs incomplete"
                );
                continue;
            };
            match indicator.calculate(inputs).await {
                Ok(series) => {
                    merged.insert(indicator.slug().to_string(), series);
                }
                Err(err) => {
                    warn!(metric = indicator.slug(), error = %err, "derived metric skipped");
                }
            }
        }
    }
}

fn post_process(spec: &SourceSpec, series: TimeSeries) -> TimeSeries {
    let series = match spec.gap_limit {
        Some(limit) => resample_daily(&series, limit),
        None => series,
    };
    match spec.source {
        SourceKind::Market => trim_stale_tail(series, STALE_TAIL_WINDOW),
        SourceKind::Fred => series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataPoint;
    use chrono::{TimeZone, Utc};

    fn dp(day: u32, value: f64) -> DataPoint {
        DataPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn post_process_interpolates_statistical_series() {
        let spec = SourceSpec {
            source: SourceKind::Fred,
            code: "WTREGEN".into(),
            key: "TGA".into(),
            lookback_days: 365,
            gap_limit: Some(2),
        };
        let raw = TimeSeries::from_points(vec![dp(1, 10.0), dp(3, 30.0)]);
        let out = post_process(&spec, raw);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn post_process_trims_frozen_market_tail() {
        let spec = SourceSpec {
            source: SourceKind::Market,
            code: "GC=F".into(),
            key: "Gold".into(),
            lookback_days: 365,
            gap_limit: None,
        };
        let raw = TimeSeries::from_points(vec![
            dp(1, 1.0),
            dp(2, 2.0),
            dp(3, 3.0),
            dp(4, 5.0),
            dp(5, 5.0),
            dp(6, 5.0),
            dp(7, 5.0),
            dp(8, 5.0),
        ]);
        let out = post_process(&spec, raw);
        assert_eq!(out.len(), 3);
    }
}
