use crate::core::currency::RateTable;
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Where the cached table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSource {
    Provider(String),
    Fallback,
    Offline,
}

impl Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateSource::Provider(name) => write!(f, "{name}"),
            RateSource::Fallback => write!(f, "built-in fallback"),
            RateSource::Offline => write!(f, "offline defaults"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedRates {
    pub table: RateTable,
    pub fetched_at: DateTime<Utc>,
    /// Moment after which the entry should be refreshed.
    pub refresh_after: DateTime<Utc>,
    pub source: RateSource,
}

impl CachedRates {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_after
    }
}

/// Process-wide holder of at most one rate table.
///
/// The entry is only ever replaced as a whole, so readers never see a
/// half-updated table. The lock is held only for the copy in or out.
#[derive(Clone, Default)]
pub struct FxCache {
    inner: Arc<Mutex<Option<CachedRates>>>,
}

impl FxCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<CachedRates> {
        let cache = self.inner.lock().await;
        let value = cache.clone();
        if value.is_some() {
            debug!("Rate cache HIT");
        } else {
            debug!("Rate cache MISS");
        }
        value
    }

    pub async fn put(&self, value: CachedRates) {
        let mut cache = self.inner.lock().await;
        debug!(source = %value.source, "Rate cache PUT");
        *cache = Some(value);
    }

    pub async fn clear(&self) {
        self.inner.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(now: DateTime<Utc>) -> CachedRates {
        CachedRates {
            table: RateTable::fallback(),
            fetched_at: now,
            refresh_after: now + Duration::seconds(3600),
            source: RateSource::Fallback,
        }
    }

    #[tokio::test]
    async fn test_cache_get_put() {
        let cache = FxCache::new();
        let now = Utc::now();

        // Initially, cache is empty
        assert!(cache.get().await.is_none());

        cache.put(entry(now)).await;
        let cached = cache.get().await.unwrap();
        assert_eq!(cached.table, RateTable::fallback());
        assert_eq!(cached.source, RateSource::Fallback);

        // Clones share the same slot
        let other = cache.clone();
        other.clear().await;
        assert!(cache.get().await.is_none());
    }

    #[test]
    fn test_freshness_window() {
        let now = Utc::now();
        let cached = entry(now);
        assert!(cached.is_fresh(now));
        assert!(cached.is_fresh(now + Duration::seconds(3599)));
        assert!(!cached.is_fresh(now + Duration::seconds(3600)));
    }
}
