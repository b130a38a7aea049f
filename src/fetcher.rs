//! Rate fetching with a time-based cache and an ordered provider fallback chain.
//!
//! [`RateFetcher`] never fails: when every provider is unreachable it keeps
//! serving the previous table, or the built-in fallback table when nothing was
//! ever fetched, and logs a warning so stale rates can be noticed.

use crate::core::config::AppConfig;
use crate::core::{CachedRates, Clock, Currency, FxCache, RateSource, RateTable, SystemClock};
use crate::providers::{ProviderError, RateProvider, RawRates, http};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub struct RateFetcher {
    providers: Vec<Box<dyn RateProvider>>,
    cache: FxCache,
    refresh_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    failure_backoff: Duration,
    offline: bool,
}

impl RateFetcher {
    pub fn new(providers: Vec<Box<dyn RateProvider>>, cache: FxCache, clock: Arc<dyn Clock>) -> Self {
        RateFetcher {
            providers,
            cache,
            refresh_lock: Mutex::new(()),
            clock,
            ttl: Duration::seconds(3600),
            failure_backoff: Duration::seconds(300),
            offline: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let providers = http::providers_from_config(config)?;
        Ok(Self::new(providers, FxCache::new(), Arc::new(SystemClock))
            .with_ttl(config.cache_ttl())
            .with_failure_backoff(config.failure_backoff())
            .with_offline(config.offline))
    }

    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = to_chrono(ttl);
        self
    }

    pub fn with_failure_backoff(mut self, backoff: std::time::Duration) -> Self {
        self.failure_backoff = to_chrono(backoff);
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn cache(&self) -> &FxCache {
        &self.cache
    }

    /// The current USD rate table, refreshing it first if it has gone stale.
    pub async fn usd_rates(&self) -> RateTable {
        self.snapshot().await.table
    }

    /// Like [`usd_rates`](Self::usd_rates) but with provenance and timestamps.
    pub async fn snapshot(&self) -> CachedRates {
        self.load(false, Duration::zero()).await
    }

    /// Refreshes regardless of how fresh the cached table is.
    pub async fn refresh(&self) -> CachedRates {
        self.load(true, Duration::zero()).await
    }

    /// Refreshes once the cached table is within `lead` of going stale, so a
    /// background task can replace it before any request sees it expire.
    pub async fn refresh_ahead(&self, lead: std::time::Duration) -> CachedRates {
        self.load(false, to_chrono(lead)).await
    }

    async fn load(&self, force: bool, lead: Duration) -> CachedRates {
        let now = self.clock.now();
        if self.offline {
            debug!("Offline mode, serving built-in rates");
            return CachedRates {
                table: RateTable::fallback(),
                fetched_at: now,
                refresh_after: later(now, self.ttl),
                source: RateSource::Offline,
            };
        }

        let current = self.cache.get().await;
        if !force {
            if let Some(cached) = current.as_ref().filter(|c| c.is_fresh(later(now, lead))) {
                debug!(source = %cached.source, "Serving cached rates");
                return cached.clone();
            }
        }

        // Held until the new entry is stored so concurrent misses share one refresh
        let _refreshing = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => match current {
                Some(stale) if !force => {
                    debug!(source = %stale.source, "Refresh in flight, serving current rates");
                    return stale;
                }
                _ => self.refresh_lock.lock().await,
            },
        };

        // Another caller may have refreshed while we waited
        let now = self.clock.now();
        let current = self.cache.get().await;
        if !force {
            if let Some(cached) = current.as_ref().filter(|c| c.is_fresh(later(now, lead))) {
                return cached.clone();
            }
        }

        let previous = current.as_ref().map(|c| c.table.clone());
        let entry = match self.fetch_from_providers(previous.as_ref()).await {
            Ok((name, table)) => {
                // Never move the timestamp backwards
                let fetched_at = current.as_ref().map_or(now, |c| c.fetched_at.max(now));
                info!(provider = %name, "Refreshed exchange rates");
                CachedRates {
                    table,
                    fetched_at,
                    refresh_after: later(fetched_at, self.ttl),
                    source: RateSource::Provider(name),
                }
            }
            Err(failures) => self.degrade(current, &failures, now),
        };

        self.cache.put(entry.clone()).await;
        entry
    }

    #[instrument(name = "RefreshRates", skip_all)]
    async fn fetch_from_providers(
        &self,
        previous: Option<&RateTable>,
    ) -> Result<(String, RateTable), Vec<(String, ProviderError)>> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            let name = provider.name().to_string();
            let outcome = match provider.fetch_usd_rates().await {
                Ok(raw) => accept_rates(&raw, previous),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(table) => return Ok((name, table)),
                Err(e) => {
                    debug!(provider = %name, error = %e, "Provider failed, trying next");
                    failures.push((name, e));
                }
            }
        }
        Err(failures)
    }

    fn degrade(
        &self,
        stale: Option<CachedRates>,
        failures: &[(String, ProviderError)],
        now: DateTime<Utc>,
    ) -> CachedRates {
        let reasons = failures
            .iter()
            .map(|(name, e)| format!("{name}: {e}"))
            .collect::<Vec<_>>()
            .join("; ");
        let refresh_after = later(now, self.failure_backoff);

        match stale {
            Some(stale) => {
                warn!(
                    fetched_at = %stale.fetched_at,
                    reasons = %reasons,
                    "All rate providers failed, keeping stale rates"
                );
                CachedRates {
                    refresh_after,
                    ..stale
                }
            }
            None => {
                warn!(reasons = %reasons, "All rate providers failed, using built-in fallback rates");
                CachedRates {
                    table: RateTable::fallback(),
                    fetched_at: now,
                    refresh_after,
                    source: RateSource::Fallback,
                }
            }
        }
    }
}

/// Validates a provider response and turns it into a complete table.
///
/// Required currencies must be present with a usable rate. Others are filled
/// from `previous`, then from the hardcoded fallback rate. USD is always 1.0.
pub fn accept_rates(raw: &RawRates, previous: Option<&RateTable>) -> Result<RateTable, ProviderError> {
    let mut table = RateTable::new();
    for (code, rate) in raw {
        if let Some(currency) = Currency::parse_code(code) {
            table.insert(currency, *rate);
        }
    }

    for currency in Currency::ALL {
        if table.contains(currency) {
            continue;
        }
        if currency.required_from_provider() {
            return Err(ProviderError::MissingCurrency(currency));
        }
        let filled = previous
            .and_then(|p| p.get(currency))
            .unwrap_or_else(|| currency.fallback_rate());
        debug!(currency = %currency, rate = filled, "Filling missing rate");
        table.insert(currency, filled);
    }
    Ok(table)
}

/// Keeps the cache warm from a background task so conversions rarely block on
/// the network. The table is replaced once it is within one `period` of going
/// stale; requests arriving meanwhile keep getting the current table.
pub fn spawn_background_refresh(
    fetcher: Arc<RateFetcher>,
    period: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let snapshot = fetcher.refresh_ahead(period).await;
            debug!(source = %snapshot.source, "Background rate check done");
        }
    })
}

fn later(from: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    from.checked_add_signed(by)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}
