//! Core types for the Polymarket gateway
//!
//! This crate holds the request-scoped building blocks shared by the upstream
//! clients, the client cache and the HTTP layer: the error taxonomy, proxy and
//! credential resolution, client fingerprints and query normalization.

pub mod classify;
pub mod credentials;
pub mod error;
pub mod fingerprint;
pub mod proxy;
pub mod query;
pub mod upstream;

pub use classify::{classify, ClassifiedError, ErrorKind};
pub use credentials::{
    resolve_credentials, CredentialFallback, CredentialHeaders, RuntimeMode, TradingCredentials,
    FUNDER_HEADER, KEY_HEADER,
};
pub use error::{GatewayError, GatewayResult};
pub use fingerprint::ClientFingerprint;
pub use proxy::{parse_proxy, ProxyDescriptor, ProxyParseError, ProxyScheme, PROXY_HEADER};
pub use query::{NormalizedHistoryQuery, PriceHistoryParams, PriceInterval};
pub use upstream::{Upstream, UpstreamTarget, POLYGON_CHAIN_ID};
