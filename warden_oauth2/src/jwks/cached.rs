use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tokio::sync::Mutex;
use warden::Jwks;

use super::KeySetSource;
use crate::error::KeySetUnavailable;

const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Entry {
    jwks: Arc<Jwks>,
    fetched_at: Instant,
}

/// Reuses a key set for a bounded time
///
/// A successful fetch is served for up to `ttl`, after which the next call
/// fetches again. Failures are never cached. A key that was rotated in
/// since the last fetch can be picked up early through
/// [`refresh`](KeySetSource::refresh), which refetches only if the cached
/// set is older than the minimum refresh interval (five seconds by
/// default).
///
/// Readers never block while the cache is fresh; concurrent refetches are
/// collapsed into one request.
#[derive(Debug)]
pub struct CachedKeySet<K> {
    inner: K,
    ttl: Duration,
    min_refresh_interval: Duration,
    entry: ArcSwapOption<Entry>,
    fetching: Mutex<()>,
}

impl<K: KeySetSource> CachedKeySet<K> {
    /// Caches key sets from `inner` for up to `ttl`
    pub fn new(inner: K, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            entry: ArcSwapOption::empty(),
            fetching: Mutex::new(()),
        }
    }

    /// Overrides how old a cached set must be before a refresh refetches it
    #[must_use]
    pub fn with_min_refresh_interval(self, min_refresh_interval: Duration) -> Self {
        Self {
            min_refresh_interval,
            ..self
        }
    }

    /// Drops the cached set so that the next call fetches
    pub fn invalidate(&self) {
        self.entry.store(None);
    }

    fn cached_within(&self, age: Duration) -> Option<Arc<Jwks>> {
        self.entry
            .load_full()
            .filter(|entry| entry.fetched_at.elapsed() < age)
            .map(|entry| Arc::clone(&entry.jwks))
    }

    async fn fetch(&self) -> Result<Arc<Jwks>, KeySetUnavailable> {
        let jwks = self.inner.key_set().await?;

        self.entry.store(Some(Arc::new(Entry {
            jwks: Arc::clone(&jwks),
            fetched_at: Instant::now(),
        })));
        tracing::info!(jwks.len = jwks.keys().len(), "JWKS refreshed");

        Ok(jwks)
    }
}

#[async_trait]
impl<K: KeySetSource> KeySetSource for CachedKeySet<K> {
    async fn key_set(&self) -> Result<Arc<Jwks>, KeySetUnavailable> {
        if let Some(jwks) = self.cached_within(self.ttl) {
            tracing::trace!("using cached JWKS");
            return Ok(jwks);
        }

        let _guard = self.fetching.lock().await;

        // Another caller may have refetched while this one waited
        if let Some(jwks) = self.cached_within(self.ttl) {
            return Ok(jwks);
        }

        self.fetch().await
    }

    async fn refresh(&self) -> Result<Option<Arc<Jwks>>, KeySetUnavailable> {
        let _guard = self.fetching.lock().await;

        if let Some(jwks) = self.cached_within(self.min_refresh_interval.min(self.ttl)) {
            tracing::debug!("JWKS refreshed too recently; reusing cached set");
            return Ok(Some(jwks));
        }

        self.fetch().await.map(Some)
    }
}
