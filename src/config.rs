use chrono::NaiveDate;
use std::env;
use std::time::Duration;

const DEFAULT_FRED_BASE: &str = "https://fred.stlouisfed.org";
const DEFAULT_MARKET_BASE: &str = "https://quotes.macroflow.io";

/// Runtime knobs for one acquisition pipeline. Base URLs are overridable so
/// tests can point the fetchers at a local server.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fred_base_url: String,
    pub market_base_url: String,
    /// Parallel fetch slots, clamped to 1..=6.
    pub workers: usize,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    /// When set, the statistical-series fetcher requests server-side
    /// windowing from this date instead of truncating client-side only.
    pub fred_window_start: Option<NaiveDate>,
    /// Fetch all market tickers in one request instead of one per ticker.
    pub batch_quotes: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fred_base_url: DEFAULT_FRED_BASE.to_string(),
            market_base_url: DEFAULT_MARKET_BASE.to_string(),
            workers: 2,
            fetch_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(4 * 3600),
            fred_window_start: None,
            batch_quotes: true,
        }
    }
}

impl PipelineConfig {
    /// Reads `MACROFLOW_*` variables, falling back to the defaults above.
    /// A `.env` file is honored when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            fred_base_url: env::var("MACROFLOW_FRED_BASE_URL").unwrap_or(defaults.fred_base_url),
            market_base_url: env::var("MACROFLOW_MARKET_BASE_URL")
                .unwrap_or(defaults.market_base_url),
            workers: env_parse("MACROFLOW_WORKERS")
                .map(|w: usize| w.clamp(1, 6))
                .unwrap_or(defaults.workers),
            fetch_timeout: env_parse("MACROFLOW_FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            cache_ttl: env_parse("MACROFLOW_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            fred_window_start: env::var("MACROFLOW_FRED_START")
                .ok()
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            batch_quotes: env_parse("MACROFLOW_BATCH_QUOTES").unwrap_or(defaults.batch_quotes),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
