use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_oauth2::{CachedKeySet, RemoteKeySet, SecurityDescriptor};

use crate::{config::Settings, routes::ApiScope};

mod config;
mod routes;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = Settings::parse();
    tracing::info!(?settings, "loaded settings");

    let descriptor = SecurityDescriptor::<ApiScope>::new(
        &settings.auth0_domain,
        &settings.auth0_api_audience,
    )?;
    let keys = RemoteKeySet::with_timeout(descriptor.jwks_url(), settings.jwks_timeout())?;

    let client_id = &settings.auth0_application_client_id;
    let app = match settings.jwks_cache_ttl() {
        Some(ttl) => routes::app(&descriptor, client_id, CachedKeySet::new(keys, ttl)),
        None => routes::app(&descriptor, client_id, keys),
    };

    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, jwks.url = descriptor.jwks_url(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                {
                    let error: &dyn std::error::Error = &err;
                    tracing::warn!(error, "unable to listen for shutdown signal");
                }
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
