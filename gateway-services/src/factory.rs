//! Upstream client construction

use async_trait::async_trait;
use gateway_core::{GatewayResult, ProxyDescriptor, TradingCredentials, UpstreamTarget};
use gateway_polymarket::{ClobClient, DataClient, GammaClient, HttpSettings};
use tracing::debug;

/// Builds upstream clients for the dispatcher
///
/// Only the dispatcher calls this, and only on a cache miss.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn gamma(
        &self,
        target: &UpstreamTarget,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<GammaClient>;

    async fn data(
        &self,
        target: &UpstreamTarget,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<DataClient>;

    /// Performs the CLOB API key handshake, so this does network I/O
    async fn clob(
        &self,
        target: &UpstreamTarget,
        credentials: &TradingCredentials,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<ClobClient>;
}

/// Factory for the real Polymarket services
#[derive(Debug, Clone, Default)]
pub struct PolymarketFactory {
    settings: HttpSettings,
}

impl PolymarketFactory {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ClientFactory for PolymarketFactory {
    async fn gamma(
        &self,
        target: &UpstreamTarget,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<GammaClient> {
        debug!("Building Gamma client (proxy: {})", proxy.is_some());
        GammaClient::new(target, &self.settings, proxy)
    }

    async fn data(
        &self,
        target: &UpstreamTarget,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<DataClient> {
        debug!("Building Data API client (proxy: {})", proxy.is_some());
        DataClient::new(target, &self.settings, proxy)
    }

    async fn clob(
        &self,
        target: &UpstreamTarget,
        credentials: &TradingCredentials,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<ClobClient> {
        debug!("Building CLOB client (proxy: {})", proxy.is_some());
        ClobClient::connect(target, credentials, &self.settings, proxy).await
    }
}
