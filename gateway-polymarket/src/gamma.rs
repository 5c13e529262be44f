//! Gamma API client
//!
//! Public market, event, tag and series metadata. No credentials involved;
//! query strings are forwarded untouched.

use gateway_core::{GatewayError, GatewayResult, ProxyDescriptor, UpstreamTarget};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::http::{build_http_client, read_json, transport_error, HttpSettings, QueryPairs};

/// Polymarket Gamma API client
#[derive(Clone)]
pub struct GammaClient {
    client: Client,
    base_url: String,
}

impl GammaClient {
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

    /// GET an arbitrary Gamma path and return the JSON body
    #[instrument(skip(self, query), fields(base = %self.base_url))]
    pub async fn get_json(&self, path: &str, query: &QueryPairs) -> GatewayResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching Gamma {}", path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error("Gamma request failed", e))?;

        read_json(path, response).await
    }

    /// List markets
    pub async fn get_markets(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json("/markets", query).await
    }

    /// Get a single market by ID
    pub async fn get_market_by_id(&self, id: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("market", "/markets", id, query).await
    }

    pub async fn get_market_by_slug(&self, slug: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("market", "/markets/slug", slug, query).await
    }

    /// List events (events group related markets)
    pub async fn get_events(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json("/events", query).await
    }

    pub async fn get_event_by_id(&self, id: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("event", "/events", id, query).await
    }

    pub async fn get_event_by_slug(&self, slug: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("event", "/events/slug", slug, query).await
    }

    pub async fn get_tags(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json("/tags", query).await
    }

    pub async fn get_tag_by_id(&self, id: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("tag", "/tags", id, query).await
    }

    pub async fn get_tag_by_slug(&self, slug: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("tag", "/tags/slug", slug, query).await
    }

    pub async fn get_series(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json("/series", query).await
    }

    pub async fn get_series_by_id(&self, id: &str, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_resource("series", "/series", id, query).await
    }

    pub async fn get_comments(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json("/comments", query).await
    }

    /// Full-text search across markets, events and profiles
    pub async fn search(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_json("/public-search", query).await
    }

    /// Check the Gamma health endpoint
    pub async fn health(&self) -> GatewayResult<()> {
        self.get_json("/health", &[]).await.map(|_| ())
    }

    /// Fetch `{collection}/{key}`, reporting a missing resource by name
    async fn get_resource(
        &self,
        kind: &str,
        collection: &str,
        key: &str,
        query: &QueryPairs,
    ) -> GatewayResult<Value> {
        let key = key.trim();
        if key.is_empty() {
            return Err(GatewayError::validation(format!("Missing {} identifier", kind)));
        }

        let path = resource_path(collection, key);
        match self.get_json(&path, query).await {
            Err(GatewayError::Upstream {
                status: Some(404), ..
            })
            | Ok(Value::Null) => Err(GatewayError::not_found(format!(
                "{} not found: {}",
                capitalize(kind),
                key
            ))),
            other => other,
        }
    }
}

fn resource_path(collection: &str, key: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(key))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl std::fmt::Debug for GammaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GammaClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
