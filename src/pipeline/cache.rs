use chrono::{DateTime, Utc};
use moka::sync::Cache;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{SeriesKey, SourceSpec, TimeSeries};

/// Bump when the result layout changes so stale entries from an older
/// build cannot be served.
pub const CACHE_VERSION: u32 = 1;

/// One cached acquisition run. The mapping is immutable once built and is
/// shared by reference for the rest of the cache window.
#[derive(Debug, Clone)]
pub struct CachedRun {
    pub fetched_at: DateTime<Utc>,
    pub series: Arc<BTreeMap<SeriesKey, TimeSeries>>,
}

/// Explicit TTL store for acquisition results, keyed by the spec set.
///
/// Freshness is checked on read against the stored fetch timestamp; the
/// underlying store additionally evicts on its own clock. There is no other
/// memoization anywhere in the pipeline.
pub struct ResultCache {
    ttl: Duration,
    inner: Cache<u64, CachedRun>,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        // moka wants a nonzero TTL
        let store_ttl = ttl.max(Duration::from_millis(1));
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(store_ttl)
            .build();
        Self { ttl, inner }
    }

    fn run_key(specs: &[SourceSpec]) -> u64 {
        let mut hasher = DefaultHasher::new();
        CACHE_VERSION.hash(&mut hasher);
        for spec in specs {
            spec.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn get(&self, specs: &[SourceSpec]) -> Option<CachedRun> {
        let hit = self.inner.get(&Self::run_key(specs))?;
        let max_age = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        if Utc::now() - hit.fetched_at >= max_age {
            return None;
        }
        Some(hit)
    }

    pub fn put(&self, specs: &[SourceSpec], series: BTreeMap<SeriesKey, TimeSeries>) -> CachedRun {
        let run = CachedRun {
            fetched_at: Utc::now(),
            series: Arc::new(series),
        };
        self.inner.insert(Self::run_key(specs), run.clone());
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn spec(key: &str, code: &str) -> SourceSpec {
        SourceSpec {
            source: SourceKind::Fred,
            code: code.to_string(),
            key: key.to_string(),
            lookback_days: 365,
            gap_limit: Some(2),
        }
    }

    #[test]
    fn round_trip_hits_for_same_spec_set() {
        let cache = ResultCache::new(Duration::from_secs(3600), 4);
        let specs = vec![spec("TGA", "WTREGEN")];
        assert!(cache.get(&specs).is_none());

        cache.put(&specs, BTreeMap::new());
        assert!(cache.get(&specs).is_some());
    }

    #[test]
    fn different_spec_set_misses() {
        let cache = ResultCache::new(Duration::from_secs(3600), 4);
        let specs_a = vec![spec("TGA", "WTREGEN")];
        let specs_b = vec![spec("TGA", "WTREGEN"), spec("SOFR", "SOFR")];

        cache.put(&specs_a, BTreeMap::new());
        assert!(cache.get(&specs_b).is_none());
    }

    #[test]
    fn zero_ttl_is_immediately_stale() {
        let cache = ResultCache::new(Duration::ZERO, 4);
        let specs = vec![spec("TGA", "WTREGEN")];
        cache.put(&specs, BTreeMap::new());
        assert!(cache.get(&specs).is_none());
    }
}
