//! API route definitions

mod admin;
mod clob;
mod data;
mod gamma;
mod health;

use axum::{
    extract::Query,
    http::{HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use gateway_core::{GatewayError, GatewayResult, Upstream};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Response header reporting whether the upstream client came from the cache
pub const CLIENT_CACHE_HEADER: &str = "x-client-cache";

/// Query string forwarded to the upstream untouched
pub type Passthrough = Query<Vec<(String, String)>>;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/gamma", gamma::routes())
        .nest("/data", data::routes())
        .nest("/clob", clob::routes())
        .nest("/admin", admin::routes())
        .merge(health::routes())
}

/// Unmatched paths answer with the regular error body
pub async fn not_found(uri: Uri) -> ApiError {
    GatewayError::not_found(format!("No route for {}", uri.path())).into()
}

/// Upstream JSON body, tagged with the client cache outcome
fn upstream_json(body: Value, cached: bool) -> Response {
    let mut response = Json(body).into_response();
    response.headers_mut().insert(
        CLIENT_CACHE_HEADER,
        HeaderValue::from_static(if cached { "hit" } else { "miss" }),
    );
    response
}

/// Upstream health check response
#[derive(Debug, Serialize)]
struct UpstreamHealth {
    status: &'static str,
    cached: bool,
}

fn upstream_health(upstream: Upstream, check: GatewayResult<()>, cached: bool) -> Response {
    match check {
        Ok(()) => (
            StatusCode::OK,
            Json(UpstreamHealth {
                status: "healthy",
                cached,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("{} health check failed: {}", upstream, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UpstreamHealth {
                    status: "unhealthy",
                    cached,
                }),
            )
                .into_response()
        }
    }
}
