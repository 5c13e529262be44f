//! Upstream service identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL for the Polymarket Gamma API (markets, events, tags)
pub const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

/// Base URL for the Polymarket CLOB API (order book, prices, trading)
pub const CLOB_API_BASE: &str = "https://clob.polymarket.com";

/// Base URL for the Polymarket Data API (positions, activity, analytics)
pub const DATA_API_BASE: &str = "https://data-api.polymarket.com";

/// Polygon mainnet chain ID
pub const POLYGON_CHAIN_ID: u64 = 137;

/// The three upstream services the gateway fronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Upstream {
    Gamma,
    Clob,
    Data,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Gamma => "gamma",
            Upstream::Clob => "clob",
            Upstream::Data => "data",
        }
    }

    /// Default public base URL for this upstream
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Upstream::Gamma => GAMMA_API_BASE,
            Upstream::Clob => CLOB_API_BASE,
            Upstream::Data => DATA_API_BASE,
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an upstream lives: base URL plus the network it signs for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamTarget {
    pub upstream: Upstream,
    pub base_url: String,
    pub chain_id: u64,
}

impl UpstreamTarget {
    pub fn new(upstream: Upstream, base_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            upstream,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chain_id,
        }
    }

    /// Target at the public Polymarket host on Polygon mainnet
    pub fn polymarket(upstream: Upstream) -> Self {
        Self::new(upstream, upstream.default_base_url(), POLYGON_CHAIN_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_trims_trailing_slash() {
        let target = UpstreamTarget::new(Upstream::Gamma, "https://gamma.test/", 137);
        assert_eq!(target.base_url, "https://gamma.test");
    }

    #[test]
    fn test_polymarket_target_uses_public_host() {
        let target = UpstreamTarget::polymarket(Upstream::Clob);
        assert_eq!(target.base_url, Upstream::Clob.default_base_url());
        assert_eq!(target.chain_id, POLYGON_CHAIN_ID);
    }
}
