//! Client fingerprints
//!
//! A fingerprint identifies one cacheable client configuration: which upstream
//! (host + network), which credentials and which egress proxy. The secret is
//! hashed on its own first so the composite never contains it in the clear.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::credentials::TradingCredentials;
use crate::proxy::ProxyDescriptor;
use crate::upstream::{Upstream, UpstreamTarget};

/// Opaque, deterministic cache key for an upstream client
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClientFingerprint {
    upstream: Upstream,
    digest: String,
}

impl ClientFingerprint {
    pub fn new(
        target: &UpstreamTarget,
        credentials: Option<&TradingCredentials>,
        proxy: Option<&ProxyDescriptor>,
    ) -> Self {
        let secret_digest = credentials
            .map(|c| hex::encode(Sha256::digest(c.secret().as_bytes())))
            .unwrap_or_default();
        let delegate = credentials
            .map(|c| c.delegate_address().to_ascii_lowercase())
            .unwrap_or_default();
        let proxy_identity = proxy.map(|p| p.cache_key()).unwrap_or_default();

        let chain_id = target.chain_id.to_string();

        let mut hasher = Sha256::new();
        for part in [
            target.upstream.as_str(),
            target.base_url.as_str(),
            chain_id.as_str(),
            secret_digest.as_str(),
            delegate.as_str(),
            proxy_identity.as_str(),
        ] {
            // Length prefix keeps field boundaries unambiguous
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }

        Self {
            upstream: target.upstream,
            digest: hex::encode(hasher.finalize()),
        }
    }

    pub fn upstream(&self) -> Upstream {
        self.upstream
    }

    /// Full hex digest
    pub fn as_str(&self) -> &str {
        &self.digest
    }

    /// First 12 hex chars, enough to tell entries apart in logs
    pub fn short(&self) -> &str {
        &self.digest[..12]
    }
}

impl fmt::Debug for ClientFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientFingerprint({}:{})", self.upstream, self.short())
    }
}

impl fmt::Display for ClientFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.upstream, self.short())
    }
}
