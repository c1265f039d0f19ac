//! geoip-edge - HTTP server entry point
//!
//! Builds the provider, the auth store and the handler once, then serves
//! every request on the configured port.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use geoip_edge::auth::store_from_config;
use geoip_edge::config::AppConfig;
use geoip_edge::geo::provider_from_config;
use geoip_edge::handler::{GeoHandler, HandlerOptions};
use geoip_edge::logging::{init_tracing, LogOutput};
use geoip_edge::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(LogOutput::Stdout)?;

    tracing::info!("Starting geoip-edge");

    let config = AppConfig::from_env();
    tracing::info!("Configuration loaded: {:?}", config);

    let options = HandlerOptions::from_config(&config);
    let provider = provider_from_config(&config)?;
    let store = store_from_config(&config)?;
    let handler = GeoHandler::build(options, provider, store)?;
    tracing::info!(options = ?handler.options(), "Handler ready");

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    let app = router::create_router(Arc::new(AppState { handler }));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
