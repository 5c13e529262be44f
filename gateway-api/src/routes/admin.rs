//! Client cache administration

use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use gateway_services::CacheStats;
use serde::Serialize;
use tracing::info;

use crate::AppState;

#[derive(Debug, Serialize)]
struct ClearResponse {
    cleared: usize,
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.dispatcher.cache().stats())
}

async fn clear_cache(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.dispatcher.cache().clear_all();
    info!("Client cache cleared via admin endpoint ({} entries)", cleared);
    Json(ClearResponse { cleared })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cache/stats", get(cache_stats))
        .route("/cache", delete(clear_cache))
}
