use std::time::Duration;
use thiserror::Error;

/// Failure to produce one series. Never fatal to a run: the orchestrator
/// records the cause and omits the key from the result mapping.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{src} returned status {status} for '{code}'")]
    Status {
        src: &'static str,
        code: String,
        status: reqwest::StatusCode,
    },

    #[error("could not parse {src} response for '{code}': {reason}")]
    Parse {
        src: &'static str,
        code: String,
        reason: String,
    },

    #[error("{src} returned no usable rows for '{code}'")]
    Empty { src: &'static str, code: String },

    #[error("fetch did not complete within {0:?}")]
    Timeout(Duration),
}

/// Failure to compute one derived metric. The metric is skipped; the run
/// continues.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("metric '{metric}' is missing input '{input}'")]
    MissingInput { metric: String, input: String },

    #[error("metric '{metric}' inputs share no common timestamps")]
    NoOverlap { metric: String },
}
