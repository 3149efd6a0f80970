// src/services/rate_provider.rs
//! Keeps the current CDI: cached value first, live value when the source answers.

use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use reqwest::Client;
use tokio::sync::RwLock;

use crate::error::CalcError;
use crate::models::{CachedRate, RateSnapshot, RateSource};
use crate::services::cdi::fetch_cdi;
use crate::services::rate_cache::RateCache;
use crate::BoxError;

/// Longest error text carried into a snapshot warning.
const MAX_WARNING_CHARS: usize = 120;

pub struct RateProvider {
    client: Client,
    source_url: String,
    timeout: Duration,
    ttl: chrono::Duration,
    cache: RateCache,
    current: RwLock<RateSnapshot>,
}

impl RateProvider {
    pub fn new(
        client: Client,
        source_url: impl Into<String>,
        timeout: Duration,
        ttl: chrono::Duration,
        cache: RateCache,
    ) -> Self {
        Self {
            client,
            source_url: source_url.into(),
            timeout,
            ttl,
            cache,
            current: RwLock::new(RateSnapshot::manual(None)),
        }
    }

    pub async fn snapshot(&self) -> RateSnapshot {
        self.current.read().await.clone()
    }

    /// Rate currently usable for calculations, if any.
    pub async fn current_rate(&self) -> Option<f64> {
        self.current.read().await.rate
    }

    /// Publish the cached value, if there is one. Returns it.
    pub async fn load_cached(&self) -> Option<CachedRate> {
        let cached = self.cache.read()?;
        let snapshot = self.from_cache(&cached, None);
        info!(
            "Using cached CDI {} (stale: {})",
            cached.value, snapshot.stale
        );
        *self.current.write().await = snapshot;
        Some(cached)
    }

    /// Cache first, then a live fetch. On fetch failure the cached value
    /// stays in place with a warning; with nothing cached the snapshot falls
    /// back to manual entry.
    pub async fn load(&self) -> RateSnapshot {
        let cached = self.load_cached().await;

        match fetch_cdi(&self.client, &self.source_url, self.timeout).await {
            Ok(fetched) => {
                let stored = self.cache.write(fetched.value, fetched.observed_at.clone());
                let snapshot = RateSnapshot {
                    rate: Some(fetched.value),
                    source: RateSource::Live,
                    observed_at: fetched.observed_at,
                    fetched_at: Some(stored.map(|c| c.fetched_at).unwrap_or_else(Utc::now)),
                    stale: false,
                    warning: None,
                };
                *self.current.write().await = snapshot.clone();
                snapshot
            }
            Err(e) => {
                let snapshot = match cached {
                    Some(cached) => {
                        warn!("CDI refresh failed, keeping cached value: {}", e);
                        self.from_cache(&cached, Some(warning_text(&e)))
                    }
                    None => {
                        error!("CDI unavailable, manual entry required: {}", e);
                        RateSnapshot::manual(Some(warning_text(&e)))
                    }
                };
                *self.current.write().await = snapshot.clone();
                snapshot
            }
        }
    }

    /// Drop the cached value and start over.
    pub async fn clear_and_reload(&self) -> Result<RateSnapshot, BoxError> {
        self.cache.clear()?;
        *self.current.write().await = RateSnapshot::manual(None);
        Ok(self.load().await)
    }

    fn from_cache(&self, cached: &CachedRate, warning: Option<String>) -> RateSnapshot {
        RateSnapshot {
            rate: Some(cached.value),
            source: RateSource::Cache,
            observed_at: cached.observed_at.clone(),
            fetched_at: Some(cached.fetched_at),
            stale: cached.is_stale(Utc::now(), self.ttl),
            warning,
        }
    }
}

fn warning_text(e: &CalcError) -> String {
    e.to_string().chars().take(MAX_WARNING_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rate_cache::{CacheStore, MemoryStore, CDI_CACHE_KEY};
    use std::sync::Arc;
    use warp::Filter;

    /// Lets a test inspect the store after handing it to the provider.
    struct SharedStore(Arc<MemoryStore>);

    impl CacheStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), BoxError> {
            self.0.remove(key)
        }
    }

    fn source(body: &'static str) -> String {
        let route = warp::path("cdi").map(move || {
            warp::http::Response::builder()
                .header("content-type", "application/json")
                .body(body)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        format!("http://{}/cdi", addr)
    }

    fn provider(url: &str, store: Arc<MemoryStore>) -> RateProvider {
        RateProvider::new(
            Client::new(),
            url,
            Duration::from_secs(2),
            chrono::Duration::hours(24),
            RateCache::new(Box::new(SharedStore(store))),
        )
    }

    const UNREACHABLE: &str = "http://127.0.0.1:9/cdi";

    #[tokio::test]
    async fn test_live_fetch_updates_cache() {
        let store = Arc::new(MemoryStore::new());
        let url = source(r#"[{"data":"17/10/2026","valor":"14,90"}]"#);
        let p = provider(&url, store.clone());

        let snapshot = p.load().await;
        assert_eq!(snapshot.rate, Some(14.9));
        assert_eq!(snapshot.source, RateSource::Live);
        assert!(snapshot.warning.is_none());
        assert!(store.get(CDI_CACHE_KEY).unwrap().unwrap().contains("14.9"));
        assert_eq!(p.current_rate().await, Some(14.9));
    }

    #[tokio::test]
    async fn test_failure_keeps_cached_value_with_warning() {
        let store = Arc::new(MemoryStore::new());
        RateCache::new(Box::new(SharedStore(store.clone()))).write(13.65, None);
        let p = provider(UNREACHABLE, store);

        let snapshot = p.load().await;
        assert_eq!(snapshot.rate, Some(13.65));
        assert_eq!(snapshot.source, RateSource::Cache);
        assert!(!snapshot.stale);
        assert!(snapshot.warning.is_some());
    }

    #[tokio::test]
    async fn test_failure_without_cache_requires_manual_entry() {
        let p = provider(UNREACHABLE, Arc::new(MemoryStore::new()));
        let snapshot = p.load().await;
        assert_eq!(snapshot.rate, None);
        assert_eq!(snapshot.source, RateSource::Manual);
        let warning = snapshot.warning.unwrap();
        assert!(warning.chars().count() <= MAX_WARNING_CHARS);
    }

    #[tokio::test]
    async fn test_malformed_payload_leaves_cache_untouched() {
        let store = Arc::new(MemoryStore::new());
        let cache = RateCache::new(Box::new(SharedStore(store.clone())));
        let before = cache.write(13.65, Some("16/10/2026".to_string())).unwrap();

        let p = provider(&source("[]"), store);
        let snapshot = p.load().await;

        assert_eq!(snapshot.source, RateSource::Cache);
        assert!(snapshot.warning.unwrap().contains("payload"));
        assert_eq!(cache.read().unwrap(), before);
    }

    #[tokio::test]
    async fn test_stale_cache_is_flagged() {
        let store = Arc::new(MemoryStore::new());
        RateCache::new(Box::new(SharedStore(store.clone())))
            .write_at(13.65, None, Utc::now() - chrono::Duration::hours(30));
        let p = provider(UNREACHABLE, store);

        let cached = p.load_cached().await.unwrap();
        assert_eq!(cached.value, 13.65);
        assert!(p.snapshot().await.stale);
    }

    #[tokio::test]
    async fn test_clear_and_reload() {
        let store = Arc::new(MemoryStore::new());
        RateCache::new(Box::new(SharedStore(store.clone()))).write(13.65, None);
        let p = provider(UNREACHABLE, store.clone());

        let snapshot = p.clear_and_reload().await.unwrap();
        assert_eq!(snapshot.source, RateSource::Manual);
        assert!(store.get(CDI_CACHE_KEY).unwrap().is_none());
    }
}
