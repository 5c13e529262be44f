//! Polymarket Gateway API Server
//!
//! Translates gateway requests into Gamma, Data and CLOB calls, reusing
//! upstream clients per credential and egress proxy.

mod config;
mod error;
mod extract;
mod routes;

use axum::{
    http::{header, HeaderName, Method},
    Router,
};
use config::GatewayConfig;
use gateway_core::{FUNDER_HEADER, KEY_HEADER, PROXY_HEADER};
use gateway_polymarket::HttpSettings;
use gateway_services::{ClientCache, PolymarketFactory, UpstreamDispatcher};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub dispatcher: Arc<UpstreamDispatcher>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let cache = Arc::new(ClientCache::new(config.cache));
        let factory = Arc::new(PolymarketFactory::new(HttpSettings::with_timeout(
            config.upstream_timeout,
        )));
        let dispatcher = UpstreamDispatcher::new(cache, factory, config.targets.clone());

        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Build the full router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(PROXY_HEADER),
            HeaderName::from_static(KEY_HEADER),
            HeaderName::from_static(FUNDER_HEADER),
        ]);

    Router::new()
        .merge(routes::api_routes())
        .fallback(routes::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gateway_api=debug")),
        )
        .init();

    info!("Starting Polymarket Gateway API");

    let config = GatewayConfig::from_env()?;
    info!(
        "Mode: {:?}, client cache: max {} entries, ttl {}s",
        config.mode,
        config.cache.max_size,
        config.cache.ttl.as_secs()
    );
    if !config.mode.is_production() && config.credential_fallback.key.is_some() {
        info!("Development credential fallback configured");
    }

    let port = config.port;
    let state = AppState::new(config);

    let sweeper = state.dispatcher.cache().start();
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
