use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::DataSource;
use crate::error::FetchError;
use crate::models::{DataPoint, SourceSpec, TimeSeries};

/// Statistical-series source: one CSV download per series code.
///
/// The plain endpoint returns the full history; the lookback window is
/// applied after retrieval. With `window_start` set, a `cosd` parameter asks
/// the server to window instead.
pub struct FredFetcher {
    client: Client,
    base_url: String,
    window_start: Option<NaiveDate>,
}

impl FredFetcher {
    pub fn new(base_url: impl Into<String>, window_start: Option<NaiveDate>, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("macroflow/0.1"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            window_start,
        }
    }

    /// Two-column CSV with a header row: date, value. Rows with the "."
    /// missing-value marker or anything unparseable are dropped silently.
    fn parse_csv(code: &str, body: &str) -> Result<Vec<DataPoint>, FetchError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());

        let mut points = Vec::new();
        for record in reader.records() {
            let Ok(record) = record else { continue };
            let (Some(date_str), Some(value_str)) = (record.get(0), record.get(1)) else {
                continue;
            };
            if value_str == "." {
                continue;
            }
            let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
                continue;
            };
            let Ok(value) = value_str.trim().parse::<f64>() else {
                continue;
            };
            let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
                continue;
            };
            points.push(DataPoint {
                timestamp: Utc.from_utc_datetime(&midnight),
                value,
            });
        }

        if points.is_empty() {
            return Err(FetchError::Empty {
                src: "fred",
                code: code.to_string(),
            });
        }
        Ok(points)
    }
}

#[async_trait]
impl DataSource for FredFetcher {
    fn name(&self) -> &'static str {
        "fred"
    }

    async fn fetch(&self, spec: &SourceSpec) -> Result<TimeSeries, FetchError> {
        let mut url = format!("{}/graph/fredgraph.csv?id={}", self.base_url, spec.code);
        if let Some(start) = self.window_start {
            url.push_str(&format!("&cosd={}", start.format("%Y-%m-%d")));
        }

        debug!(code = %spec.code, "requesting statistical series");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                src: "fred",
                code: spec.code.clone(),
                status: resp.status(),
            });
        }

        let body = resp.text().await?;
        let points = Self::parse_csv(&spec.code, &body)?;
        let cutoff = Utc::now() - chrono::Duration::days(spec.lookback_days);
        Ok(TimeSeries::from_points(points).since(cutoff))
    }
}
