use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use warden::Jwks;

use super::KeySetSource;
use crate::error::{self, KeySetUnavailable};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A key set fetched from a remote JWKS endpoint
///
/// Every call to [`key_set`](KeySetSource::key_set) issues a fresh request.
/// Wrap the source in a [`CachedKeySet`](super::CachedKeySet) to reuse
/// results.
#[derive(Debug, Clone)]
pub struct RemoteKeySet {
    jwks_url: String,
    client: Client,
}

impl RemoteKeySet {
    /// Fetches from `jwks_url` with a ten second request timeout
    ///
    /// # Errors
    ///
    /// The HTTP client could not be initialized.
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_timeout(jwks_url, DEFAULT_TIMEOUT)
    }

    /// Fetches from `jwks_url`, giving up on requests that take longer than
    /// `timeout`
    ///
    /// # Errors
    ///
    /// The HTTP client could not be initialized.
    pub fn with_timeout(
        jwks_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("warden_oauth2/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(jwks_url, client))
    }

    /// Fetches from `jwks_url` using a preconfigured client
    #[must_use]
    pub fn with_client(jwks_url: impl Into<String>, client: Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            client,
        }
    }

    /// The endpoint keys are fetched from
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetches the key set
    ///
    /// No retries are attempted.
    ///
    /// # Errors
    ///
    /// The request failed, timed out, returned an unsuccessful status, or
    /// returned a body that is not a key set.
    #[tracing::instrument(skip(self), fields(jwks.url = %self.jwks_url))]
    pub async fn fetch(&self) -> Result<Jwks, KeySetUnavailable> {
        tracing::debug!("fetching JWKS");

        let response = self.client.get(&self.jwks_url).send().await.map_err(|err| {
            let error: &dyn std::error::Error = &err;
            tracing::warn!(error, "JWKS fetch failed; request error");
            error::key_set_unavailable(&self.jwks_url, err)
        })?;

        if let Err(err) = response.error_for_status_ref() {
            let error: &dyn std::error::Error = &err;
            tracing::warn!(
                error,
                http.status_code = response.status().as_u16(),
                "JWKS fetch failed; unexpected response status",
            );
            return Err(error::key_set_unavailable(&self.jwks_url, err));
        }

        match response.json::<Jwks>().await {
            Ok(jwks) => {
                tracing::debug!(jwks.len = jwks.keys().len(), "JWKS fetched");
                Ok(jwks)
            }
            Err(err) => {
                let error: &dyn std::error::Error = &err;
                tracing::warn!(error, "JWKS fetch failed; unexpected body");
                Err(error::key_set_unavailable(&self.jwks_url, err))
            }
        }
    }
}

#[async_trait]
impl KeySetSource for RemoteKeySet {
    async fn key_set(&self) -> Result<Arc<Jwks>, KeySetUnavailable> {
        self.fetch().await.map(Arc::new)
    }
}
