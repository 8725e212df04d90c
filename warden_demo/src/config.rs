use std::{net::SocketAddr, time::Duration};

use clap::Parser;

/// Settings for the demo API, read from flags or `APP_*` environment
/// variables
///
/// A `.env` file in the working directory is loaded first, so any of these
/// may be kept there.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Settings {
    /// The Auth0 tenant domain that issues tokens, such as `tenant.us.auth0.com`
    #[arg(long, env = "APP_AUTH0_DOMAIN")]
    pub auth0_domain: String,

    /// The audience tokens must be issued for
    #[arg(long, env = "APP_AUTH0_API_AUDIENCE")]
    pub auth0_api_audience: String,

    /// The client that API documentation tooling should log in as
    #[arg(long, env = "APP_AUTH0_APPLICATION_CLIENT_ID")]
    pub auth0_application_client_id: String,

    /// The address to listen on
    #[arg(long, env = "APP_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// Reuse the fetched key set for this many seconds
    ///
    /// When unset, keys are fetched for every request.
    #[arg(long, env = "APP_JWKS_CACHE_TTL_SECS")]
    pub jwks_cache_ttl_secs: Option<u64>,

    /// Give up on a key set fetch after this many seconds
    #[arg(long, env = "APP_JWKS_TIMEOUT_SECS", default_value_t = 10)]
    pub jwks_timeout_secs: u64,
}

impl Settings {
    pub fn jwks_cache_ttl(&self) -> Option<Duration> {
        self.jwks_cache_ttl_secs.map(Duration::from_secs)
    }

    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_secs)
    }
}
