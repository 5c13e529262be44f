//! Data API client
//!
//! User positions, trades, activity, holders and market-level aggregates.

use gateway_core::{GatewayResult, ProxyDescriptor, UpstreamTarget};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::http::{build_http_client, read_json, transport_error, HttpSettings, QueryPairs};

/// Read-only Data API collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataEndpoint {
    Positions,
    ClosedPositions,
    Trades,
    Activity,
    Holders,
    Value,
    Traded,
    OpenInterest,
    LiveVolume,
}

impl DataEndpoint {
    pub const ALL: [DataEndpoint; 9] = [
        DataEndpoint::Positions,
        DataEndpoint::ClosedPositions,
        DataEndpoint::Trades,
        DataEndpoint::Activity,
        DataEndpoint::Holders,
        DataEndpoint::Value,
        DataEndpoint::Traded,
        DataEndpoint::OpenInterest,
        DataEndpoint::LiveVolume,
    ];

    /// Upstream path, also used as the gateway route suffix
    pub fn path(&self) -> &'static str {
        match self {
            DataEndpoint::Positions => "/positions",
            DataEndpoint::ClosedPositions => "/closed-positions",
            DataEndpoint::Trades => "/trades",
            DataEndpoint::Activity => "/activity",
            DataEndpoint::Holders => "/holders",
            DataEndpoint::Value => "/value",
            DataEndpoint::Traded => "/traded",
            DataEndpoint::OpenInterest => "/oi",
            DataEndpoint::LiveVolume => "/live-volume",
        }
    }
}

/// Polymarket Data API client
#[derive(Clone)]
pub struct DataClient {
    client: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(
        target: &UpstreamTarget,
        settings: &HttpSettings,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<Self> {
        Ok(Self {
            client: build_http_client(settings, proxy)?,
            base_url: target.base_url.clone(),
        })
    }

    #[instrument(skip(self, query), fields(base = %self.base_url))]
    pub async fn get_json(&self, path: &str, query: &QueryPairs) -> GatewayResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching Data API {}", path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error("Data API request failed", e))?;

        read_json(path, response).await
    }

    pub async fn fetch(&self, endpoint: DataEndpoint, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json(endpoint.path(), query).await
    }

    /// The Data API answers `GET /` with `{"data": "OK"}`
    pub async fn health(&self) -> GatewayResult<()> {
        self.get_json("/", &[]).await.map(|_| ())
    }
}

impl std::fmt::Debug for DataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_endpoint_paths_unique() {
        let paths: HashSet<_> = DataEndpoint::ALL.iter().map(|e| e.path()).collect();
        assert_eq!(paths.len(), DataEndpoint::ALL.len());
        assert!(paths.iter().all(|p| p.starts_with('/')));
    }

    #[test]
    fn test_open_interest_path() {
        assert_eq!(DataEndpoint::OpenInterest.path(), "/oi");
    }
}
