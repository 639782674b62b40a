//! Macro liquidity data acquisition pipeline.
//!
//! Pulls heterogeneous time series from two external systems (a
//! statistical-series CSV endpoint and a market-quotes backend), normalizes
//! them to clean daily series (gap-limited interpolation, stale-tail
//! trimming), and derives spread/ratio/composite indicators over aligned
//! indices. One [`Orchestrator::run`] produces an immutable key -> series
//! mapping; every failure degrades to a missing key, never a failed run.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod indicators;
pub mod models;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{FetchError, MetricError};
pub use models::{DataPoint, SeriesKey, SourceKind, SourceSpec, TimeSeries};
pub use pipeline::orchestrator::Orchestrator;
