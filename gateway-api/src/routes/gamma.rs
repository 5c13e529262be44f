//! Gamma (market metadata) endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use gateway_core::Upstream;

use super::{upstream_health, upstream_json, Passthrough};
use crate::error::ApiError;
use crate::extract::EgressProxy;
use crate::AppState;

type ApiResult = Result<Response, ApiError>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/markets", get(list_markets))
        .route("/markets/{id}", get(get_market))
        .route("/markets/slug/{slug}", get(get_market_by_slug))
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/events/slug/{slug}", get(get_event_by_slug))
        .route("/tags", get(list_tags))
        .route("/tags/{id}", get(get_tag))
        .route("/tags/slug/{slug}", get(get_tag_by_slug))
        .route("/series", get(list_series))
        .route("/series/{id}", get(get_series))
        .route("/comments", get(list_comments))
        .route("/search", get(search))
        .route("/health", get(health))
}

async fn list_markets(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_markets(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_market(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(id): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_market_by_id(&id, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_market_by_slug(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(slug): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_market_by_slug(&slug, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn list_events(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_events(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_event(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(id): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_event_by_id(&id, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_event_by_slug(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(slug): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_event_by_slug(&slug, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn list_tags(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_tags(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_tag(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(id): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_tag_by_id(&id, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_tag_by_slug(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(slug): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_tag_by_slug(&slug, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn list_series(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_series(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn get_series(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Path(id): Path<String>,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_series_by_id(&id, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn list_comments(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.get_comments(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn search(
    State(state): State<AppState>,
    proxy: EgressProxy,
    Query(query): Passthrough,
) -> ApiResult {
    let lease = state.dispatcher.gamma(proxy.as_ref()).await?;
    let body = lease.handle.search(&query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn health(State(state): State<AppState>, proxy: EgressProxy) -> Response {
    match state.dispatcher.gamma(proxy.as_ref()).await {
        Ok(lease) => upstream_health(Upstream::Gamma, lease.handle.health().await, lease.cached),
        Err(e) => upstream_health(Upstream::Gamma, Err(e), false),
    }
}
