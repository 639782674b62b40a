use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::DataSource;
use crate::error::FetchError;
use crate::models::{DataPoint, SeriesKey, SourceSpec, TimeSeries};

/// One daily bar. Only the close survives normalization; bars without a
/// close (halted sessions, pre-listing padding) are dropped.
#[derive(Debug, Deserialize)]
pub struct Bar {
    #[serde(default, alias = "ticker")]
    pub symbol: Option<String>,
    pub date: String,
    pub close: Option<f64>,
}

/// The quotes backend answers in one of two shapes: a flat bar table
/// (single-ticker requests, each row optionally tagged with its symbol) or a
/// ticker-keyed table (batch requests). Both normalize to per-ticker points.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuoteTable {
    TickerKeyed(BTreeMap<String, Vec<Bar>>),
    Flat(Vec<Bar>),
}

impl QuoteTable {
    /// Collapse either shape into per-ticker point lists. Flat rows without
    /// a symbol are attributed to `fallback` when given, dropped otherwise.
    pub fn normalize(self, fallback: Option<&str>) -> BTreeMap<String, Vec<DataPoint>> {
        let mut out: BTreeMap<String, Vec<DataPoint>> = BTreeMap::new();
        match self {
            QuoteTable::TickerKeyed(map) => {
                for (ticker, bars) in map {
                    let points = bars.into_iter().filter_map(bar_to_point).collect();
                    out.insert(ticker, points);
                }
            }
            QuoteTable::Flat(bars) => {
                for bar in bars {
                    let ticker = match (&bar.symbol, fallback) {
                        (Some(s), _) => s.clone(),
                        (None, Some(f)) => f.to_string(),
                        (None, None) => continue,
                    };
                    if let Some(point) = bar_to_point(bar) {
                        out.entry(ticker).or_default().push(point);
                    }
                }
            }
        }
        out
    }
}

fn bar_to_point(bar: Bar) -> Option<DataPoint> {
    let close = bar.close?;
    let date = NaiveDate::parse_from_str(&bar.date, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(DataPoint {
        timestamp: Utc.from_utc_datetime(&midnight),
        value: close,
    })
}

/// Market-quotes source: historical daily bars by ticker, serial or batched.
pub struct MarketFetcher {
    client: Client,
    base_url: String,
}

impl MarketFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
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
        }
    }

    /// Lookback period string the backend understands: "2y", "6m", "90d".
    fn period_param(days: i64) -> String {
        if days >= 365 && days % 365 == 0 {
            format!("{}y", days / 365)
        } else if days >= 30 && days % 30 == 0 {
            format!("{}m", days / 30)
        } else {
            format!("{}d", days.max(1))
        }
    }

    async fn request(&self, symbols: &str, range: &str) -> Result<QuoteTable, FetchError> {
        let url = format!("{}/history", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbols", symbols), ("range", range), ("interval", "1d")])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                src: "market",
                code: symbols.to_string(),
                status: resp.status(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse {
            src: "market",
            code: symbols.to_string(),
            reason: e.to_string(),
        })
    }

    fn clip(spec: &SourceSpec, points: Vec<DataPoint>) -> Result<TimeSeries, FetchError> {
        if points.is_empty() {
            return Err(FetchError::Empty {
                src: "market",
                code: spec.code.clone(),
            });
        }
        let cutoff = Utc::now() - chrono::Duration::days(spec.lookback_days);
        Ok(TimeSeries::from_points(points).since(cutoff))
    }
}

#[async_trait]
impl DataSource for MarketFetcher {
    fn name(&self) -> &'static str {
        "market"
    }

    async fn fetch(&self, spec: &SourceSpec) -> Result<TimeSeries, FetchError> {
        let range = Self::period_param(spec.lookback_days);
        debug!(ticker = %spec.code, %range, "requesting daily bars");
        let table = self.request(&spec.code, &range).await?;
        let mut by_ticker = table.normalize(Some(&spec.code));
        let points = by_ticker.remove(&spec.code).unwrap_or_default();
        Self::clip(spec, points)
    }

    async fn fetch_batch(
        &self,
        specs: &[SourceSpec],
    ) -> Result<Vec<(SeriesKey, Result<TimeSeries, FetchError>)>, FetchError> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        let symbols = specs.iter().map(|s| s.code.as_str()).collect::<Vec<_>>().join(",");
        let days = specs.iter().map(|s| s.lookback_days).max().unwrap_or(365);
        let range = Self::period_param(days);

        debug!(%symbols, %range, "requesting batched daily bars");
        let table = self.request(&symbols, &range).await?;
        let mut by_ticker = table.normalize(None);

        Ok(specs
            .iter()
            .map(|spec| {
                let points = by_ticker.remove(&spec.code).unwrap_or_default();
                (spec.key.clone(), Self::clip(spec, points))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_at(points: &[DataPoint], idx: usize) -> f64 {
        points[idx].value
    }

    #[test]
    fn normalize_flat_untagged_rows() {
        let body = r#"[
            {"date": "2024-01-02", "close": 2064.4},
            {"date": "2024-01-03", "close": null},
            {"date": "2024-01-04", "close": 2050.0}
        ]"#;
        let table: QuoteTable = serde_json::from_str(body).unwrap();
        let map = table.normalize(Some("GC=F"));
        let points = &map["GC=F"];
        assert_eq!(points.len(), 2);
        assert_eq!(value_at(points, 0), 2064.4);
    }

    #[test]
    fn normalize_flat_tagged_rows_group_by_symbol() {
        let body = r#"[
            {"symbol": "GC=F", "date": "2024-01-02", "close": 2064.4},
            {"symbol": "CL=F", "date": "2024-01-02", "close": 70.38}
        ]"#;
        let table: QuoteTable = serde_json::from_str(body).unwrap();
        let map = table.normalize(None);
        assert_eq!(map.len(), 2);
        assert_eq!(value_at(&map["CL=F"], 0), 70.38);
    }

    #[test]
    fn normalize_ticker_keyed_table() {
        let body = r#"{
            "GC=F": [{"date": "2024-01-02", "close": 2064.4}],
            "CL=F": [{"date": "2024-01-02", "close": 70.38}, {"date": "2024-01-03", "close": null}]
        }"#;
        let table: QuoteTable = serde_json::from_str(body).unwrap();
        assert!(matches!(table, QuoteTable::TickerKeyed(_)));
        let map = table.normalize(None);
        assert_eq!(map["GC=F"].len(), 1);
        assert_eq!(map["CL=F"].len(), 1);
    }

    #[test]
    fn normalize_drops_bad_dates() {
        let body = r#"[{"date": "02/01/2024", "close": 1.0}, {"date": "2024-01-02", "close": 2.0}]"#;
        let table: QuoteTable = serde_json::from_str(body).unwrap();
        let map = table.normalize(Some("X"));
        assert_eq!(map["X"].len(), 1);
    }

    #[test]
    fn period_param_formats() {
        assert_eq!(MarketFetcher::period_param(365), "1y");
        assert_eq!(MarketFetcher::period_param(730), "2y");
        assert_eq!(MarketFetcher::period_param(180), "6m");
        assert_eq!(MarketFetcher::period_param(90), "3m");
        assert_eq!(MarketFetcher::period_param(45), "45d");
    }
}
