//! CLOB endpoints
//!
//! Every route resolves trading credentials first: the CLOB client is scoped
//! to the signer, so even public book data goes through an authenticated client.

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use gateway_core::{PriceHistoryParams, Upstream};
use serde::Deserialize;

use super::{upstream_health, upstream_json, Passthrough};
use crate::error::ApiError;
use crate::extract::{Credentials, EgressProxy};
use crate::AppState;

type ApiResult = Result<Response, ApiError>;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub token_id: Option<String>,
    pub side: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prices-history", get(prices_history))
        .route("/book", get(order_book))
        .route("/price", get(price))
        .route("/midpoint", get(midpoint))
        .route("/spread", get(spread))
        .route("/orders", get(open_orders))
        .route("/trades", get(trades))
        .route("/time", get(server_time))
        .route("/health", get(health))
}

async fn prices_history(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(params): Query<PriceHistoryParams>,
    State(state): State<AppState>,
) -> ApiResult {
    // Reject bad ranges before a client is built for them
    let query = params.normalize()?;

    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease.handle.prices_history(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn order_book(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease
        .handle
        .order_book(query.token_id.as_deref().unwrap_or_default())
        .await?;
    Ok(upstream_json(body, lease.cached))
}

async fn price(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(query): Query<PriceQuery>,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease
        .handle
        .price(
            query.token_id.as_deref().unwrap_or_default(),
            query.side.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(upstream_json(body, lease.cached))
}

async fn midpoint(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease
        .handle
        .midpoint(query.token_id.as_deref().unwrap_or_default())
        .await?;
    Ok(upstream_json(body, lease.cached))
}

async fn spread(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease
        .handle
        .spread(query.token_id.as_deref().unwrap_or_default())
        .await?;
    Ok(upstream_json(body, lease.cached))
}

async fn open_orders(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(query): Passthrough,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease.handle.open_orders(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn trades(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    Query(query): Passthrough,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease.handle.trades(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

/// CLOB server time in unix seconds
async fn server_time(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    State(state): State<AppState>,
) -> ApiResult {
    let lease = state.dispatcher.clob(&credentials, proxy.as_ref()).await?;
    let body = lease.handle.server_time().await?;
    Ok(upstream_json(body, lease.cached))
}

// A failed handshake is reported as unhealthy, not as an error body
async fn health(
    Credentials(credentials): Credentials,
    proxy: EgressProxy,
    State(state): State<AppState>,
) -> Response {
    match state.dispatcher.clob(&credentials, proxy.as_ref()).await {
        Ok(lease) => upstream_health(Upstream::Clob, lease.handle.health().await, lease.cached),
        Err(e) => upstream_health(Upstream::Clob, Err(e), false),
    }
}
