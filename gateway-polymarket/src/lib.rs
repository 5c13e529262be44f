//! Polymarket upstream facades
//!
//! One client type per upstream service:
//! - [`GammaClient`]: public market/event metadata
//! - [`DataClient`]: user positions, trades and analytics
//! - [`ClobClient`]: order book data plus L2-authenticated account queries
//!
//! Every client is built for an explicit egress proxy and never reads proxy
//! settings from the environment.

pub mod auth;
pub mod clob;
pub mod data;
pub mod gamma;
pub mod http;

#[cfg(test)]
mod test_server;

pub use auth::{ApiCredentials, L1Signer};
pub use clob::ClobClient;
pub use data::{DataClient, DataEndpoint};
pub use gamma::GammaClient;
pub use http::{build_http_client, HttpSettings, QueryPairs};
