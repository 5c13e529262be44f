//! Request context extractors

use axum::{extract::FromRequestParts, http::request::Parts};
use gateway_core::{
    parse_proxy, resolve_credentials, CredentialHeaders, ProxyDescriptor, TradingCredentials,
    FUNDER_HEADER, KEY_HEADER, PROXY_HEADER,
};
use std::convert::Infallible;

use crate::error::ApiError;
use crate::AppState;

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

/// Egress proxy requested through `x-http-proxy`
///
/// Never rejects: a malformed header is logged and ignored.
#[derive(Debug, Clone)]
pub struct EgressProxy(pub Option<ProxyDescriptor>);

impl EgressProxy {
    pub fn as_ref(&self) -> Option<&ProxyDescriptor> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for EgressProxy
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parse_proxy(header(parts, PROXY_HEADER))))
    }
}

/// Trading credentials from `x-polymarket-key` / `x-polymarket-funder`
///
/// Outside production, missing headers fall back to configured values.
pub struct Credentials(pub TradingCredentials);

impl FromRequestParts<AppState> for Credentials {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = CredentialHeaders {
            key: header(parts, KEY_HEADER),
            funder: header(parts, FUNDER_HEADER),
        };

        let credentials = resolve_credentials(
            headers,
            state.config.mode,
            &state.config.credential_fallback,
        )?;
        Ok(Self(credentials))
    }
}
