//! Sources of the issuer's public signing keys

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use warden::Jwks;

use crate::error::KeySetUnavailable;

mod cached;
mod remote;

pub use cached::CachedKeySet;
pub use remote::RemoteKeySet;

/// Provides the key set used to verify token signatures
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// The key set to verify the current token against
    ///
    /// # Errors
    ///
    /// The key set could not be retrieved.
    async fn key_set(&self) -> Result<Arc<Jwks>, KeySetUnavailable>;

    /// A key set at least as recent as the one last returned, requested
    /// when a token names a key that set does not hold
    ///
    /// Returns `None` when there is nothing newer to be had, as for a
    /// source that already fetches on every call.
    ///
    /// # Errors
    ///
    /// The key set could not be retrieved.
    async fn refresh(&self) -> Result<Option<Arc<Jwks>>, KeySetUnavailable> {
        Ok(None)
    }
}

#[async_trait]
impl<K: KeySetSource + ?Sized> KeySetSource for Arc<K> {
    async fn key_set(&self) -> Result<Arc<Jwks>, KeySetUnavailable> {
        K::key_set(self).await
    }

    async fn refresh(&self) -> Result<Option<Arc<Jwks>>, KeySetUnavailable> {
        K::refresh(self).await
    }
}

#[async_trait]
impl<K: KeySetSource + ?Sized> KeySetSource for Box<K> {
    async fn key_set(&self) -> Result<Arc<Jwks>, KeySetUnavailable> {
        K::key_set(self).await
    }

    async fn refresh(&self) -> Result<Option<Arc<Jwks>>, KeySetUnavailable> {
        K::refresh(self).await
    }
}

/// A key set held in memory
///
/// Useful for tests and for deployments that pin their keys. The set can
/// be swapped out at any time without blocking readers.
#[derive(Debug)]
pub struct StaticKeySet {
    jwks: ArcSwap<Jwks>,
}

impl StaticKeySet {
    /// Serves the given key set
    #[must_use]
    pub fn new(jwks: Jwks) -> Self {
        Self {
            jwks: ArcSwap::from_pointee(jwks),
        }
    }

    /// Replaces the key set served from now on
    pub fn set_jwks(&self, jwks: Jwks) {
        self.jwks.store(Arc::new(jwks));
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn key_set(&self) -> Result<Arc<Jwks>, KeySetUnavailable> {
        Ok(self.jwks.load_full())
    }
}
