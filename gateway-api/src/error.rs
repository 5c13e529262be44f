//! Error responses
//!
//! Every handler failure leaves as `{ "type": <kind>, "error": <message> }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{classify, ClassifiedError, ErrorKind, GatewayError};
use serde::Serialize;
use tracing::{error, warn};

/// Handler error, already classified
#[derive(Debug)]
pub struct ApiError(pub ClassifiedError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(classify(&err))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let classified = self.0;
        let cause = classified.cause.as_deref().unwrap_or(&classified.message);

        match classified.kind {
            ErrorKind::UpstreamFailure | ErrorKind::Unavailable => {
                error!("Request failed ({}): {}", classified.kind, cause);
            }
            ErrorKind::Validation | ErrorKind::NotFound => {
                warn!("Request rejected ({}): {}", classified.kind, classified.message);
            }
        }

        let status = StatusCode::from_u16(classified.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            Json(ErrorResponse {
                kind: classified.kind,
                error: classified.public_message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: GatewayError) -> (StatusCode, Value) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_keeps_message() {
        let (status, body) = render(GatewayError::validation("Missing required parameter: market")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "validation");
        assert_eq!(body["error"], "Missing required parameter: market");
    }

    #[tokio::test]
    async fn test_upstream_not_found() {
        let (status, body) = render(GatewayError::upstream(Some(404), "market not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], "not_found");
    }

    #[tokio::test]
    async fn test_server_errors_hide_detail() {
        let (status, body) = render(GatewayError::network("reset by 10.1.2.3")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "upstream_failure");
        assert_eq!(body["error"], "Upstream service error");

        let (status, body) = render(GatewayError::unavailable("connect timeout")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["type"], "unavailable");
    }
}
