//! Data API endpoints

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};
use gateway_core::Upstream;
use gateway_polymarket::DataEndpoint;

use super::{upstream_health, upstream_json, Passthrough};
use crate::error::ApiError;
use crate::extract::EgressProxy;
use crate::AppState;

/// One GET route per Data API collection, mounted at the upstream path
pub fn routes() -> Router<AppState> {
    DataEndpoint::ALL
        .into_iter()
        .fold(Router::new(), |router, endpoint| {
            router.route(
                endpoint.path(),
                get(
                    move |State(state): State<AppState>,
                          proxy: EgressProxy,
                          Query(query): Passthrough| async move {
                        fetch(endpoint, state, proxy, query).await
                    },
                ),
            )
        })
        .route("/health", get(health))
}

async fn fetch(
    endpoint: DataEndpoint,
    state: AppState,
    proxy: EgressProxy,
    query: Vec<(String, String)>,
) -> Result<Response, ApiError> {
    let lease = state.dispatcher.data(proxy.as_ref()).await?;
    let body = lease.handle.fetch(endpoint, &query).await?;
    Ok(upstream_json(body, lease.cached))
}

async fn health(State(state): State<AppState>, proxy: EgressProxy) -> Response {
    match state.dispatcher.data(proxy.as_ref()).await {
        Ok(lease) => upstream_health(Upstream::Data, lease.handle.health().await, lease.cached),
        Err(e) => upstream_health(Upstream::Data, Err(e), false),
    }
}
