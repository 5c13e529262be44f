//! Upstream dispatch
//!
//! Resolves the client for a request: computes its fingerprint, then serves it
//! from the [`ClientCache`] or builds it through the [`ClientFactory`].

use gateway_core::{
    ClientFingerprint, GatewayError, GatewayResult, ProxyDescriptor, TradingCredentials, Upstream,
    UpstreamTarget,
};
use gateway_polymarket::{ClobClient, DataClient, GammaClient};
use std::sync::Arc;

use crate::client_cache::{ClientCache, Lease};
use crate::factory::ClientFactory;

/// Any cached upstream client
#[derive(Debug, Clone)]
pub enum UpstreamClient {
    Gamma(Arc<GammaClient>),
    Data(Arc<DataClient>),
    Clob(Arc<ClobClient>),
}

impl UpstreamClient {
    pub fn upstream(&self) -> Upstream {
        match self {
            UpstreamClient::Gamma(_) => Upstream::Gamma,
            UpstreamClient::Data(_) => Upstream::Data,
            UpstreamClient::Clob(_) => Upstream::Clob,
        }
    }
}

/// Base URLs and network for each upstream
#[derive(Debug, Clone)]
pub struct UpstreamTargets {
    pub gamma: UpstreamTarget,
    pub data: UpstreamTarget,
    pub clob: UpstreamTarget,
}

impl Default for UpstreamTargets {
    fn default() -> Self {
        Self {
            gamma: UpstreamTarget::polymarket(Upstream::Gamma),
            data: UpstreamTarget::polymarket(Upstream::Data),
            clob: UpstreamTarget::polymarket(Upstream::Clob),
        }
    }
}

/// Hands out cached upstream clients
pub struct UpstreamDispatcher {
    cache: Arc<ClientCache<UpstreamClient>>,
    factory: Arc<dyn ClientFactory>,
    targets: UpstreamTargets,
}

impl UpstreamDispatcher {
    pub fn new(
        cache: Arc<ClientCache<UpstreamClient>>,
        factory: Arc<dyn ClientFactory>,
        targets: UpstreamTargets,
    ) -> Self {
        Self {
            cache,
            factory,
            targets,
        }
    }

    pub fn cache(&self) -> &Arc<ClientCache<UpstreamClient>> {
        &self.cache
    }

    pub async fn gamma(
        &self,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<Lease<Arc<GammaClient>>> {
        let target = &self.targets.gamma;
        let fingerprint = ClientFingerprint::new(target, None, proxy);

        let lease = self
            .cache
            .get_or_create(&fingerprint, move || async move {
                let client = self.factory.gamma(target, proxy).await?;
                Ok::<_, GatewayError>(UpstreamClient::Gamma(Arc::new(client)))
            })
            .await?;

        match lease.handle {
            UpstreamClient::Gamma(client) => Ok(Lease {
                handle: client,
                cached: lease.cached,
            }),
            other => Err(mismatch(Upstream::Gamma, &other)),
        }
    }

    pub async fn data(
        &self,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<Lease<Arc<DataClient>>> {
        let target = &self.targets.data;
        let fingerprint = ClientFingerprint::new(target, None, proxy);

        let lease = self
            .cache
            .get_or_create(&fingerprint, move || async move {
                let client = self.factory.data(target, proxy).await?;
                Ok::<_, GatewayError>(UpstreamClient::Data(Arc::new(client)))
            })
            .await?;

        match lease.handle {
            UpstreamClient::Data(client) => Ok(Lease {
                handle: client,
                cached: lease.cached,
            }),
            other => Err(mismatch(Upstream::Data, &other)),
        }
    }

    pub async fn clob(
        &self,
        credentials: &TradingCredentials,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<Lease<Arc<ClobClient>>> {
        let target = &self.targets.clob;
        let fingerprint = ClientFingerprint::new(target, Some(credentials), proxy);

        let lease = self
            .cache
            .get_or_create(&fingerprint, move || async move {
                let client = self.factory.clob(target, credentials, proxy).await?;
                Ok::<_, GatewayError>(UpstreamClient::Clob(Arc::new(client)))
            })
            .await?;

        match lease.handle {
            UpstreamClient::Clob(client) => Ok(Lease {
                handle: client,
                cached: lease.cached,
            }),
            other => Err(mismatch(Upstream::Clob, &other)),
        }
    }
}

// Unreachable while the upstream is part of the fingerprint
fn mismatch(expected: Upstream, found: &UpstreamClient) -> GatewayError {
    GatewayError::internal(format!(
        "Client cache returned a {} client for a {} fingerprint",
        found.upstream(),
        expected
    ))
}
