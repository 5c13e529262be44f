//! Service layer for the Polymarket gateway
//!
//! Owns the credential-scoped client cache and the dispatcher that resolves
//! request context (credentials + proxy) into a ready upstream client.

pub mod client_cache;
pub mod dispatcher;
pub mod factory;

pub use client_cache::{CacheConfig, CacheStats, CacheSweeper, ClientCache, Lease};
pub use dispatcher::{UpstreamClient, UpstreamDispatcher, UpstreamTargets};
pub use factory::{ClientFactory, PolymarketFactory};
