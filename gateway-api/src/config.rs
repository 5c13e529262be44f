//! Server configuration from environment variables

use gateway_core::{CredentialFallback, RuntimeMode, Upstream, UpstreamTarget, POLYGON_CHAIN_ID};
use gateway_polymarket::http::DEFAULT_TIMEOUT_SECS;
use gateway_services::client_cache::{DEFAULT_MAX_SIZE, DEFAULT_SWEEP_SECS, DEFAULT_TTL_SECS};
use gateway_services::{CacheConfig, UpstreamTargets};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub mode: RuntimeMode,
    pub cache: CacheConfig,
    pub upstream_timeout: Duration,
    pub targets: UpstreamTargets,
    /// Development-only stand-ins for the credential headers
    pub credential_fallback: CredentialFallback,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            mode: RuntimeMode::default(),
            cache: CacheConfig::default(),
            upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            targets: UpstreamTargets::default(),
            credential_fallback: CredentialFallback::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_or(&get, "SERVER_PORT", DEFAULT_PORT)?;
        let mode = get("GATEWAY_ENV")
            .map(|value| RuntimeMode::from_env_value(&value))
            .unwrap_or_default();

        let cache = CacheConfig {
            max_size: positive_or(&get, "CLIENT_CACHE_MAX_SIZE", DEFAULT_MAX_SIZE)?,
            ttl: Duration::from_secs(positive_or(&get, "CLIENT_CACHE_TTL_SECS", DEFAULT_TTL_SECS)?),
            sweep_interval: Duration::from_secs(parse_or(
                &get,
                "CLIENT_CACHE_SWEEP_SECS",
                DEFAULT_SWEEP_SECS,
            )?),
        };

        let upstream_timeout = Duration::from_secs(positive_or(
            &get,
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        let chain_id = parse_or(&get, "POLYGON_CHAIN_ID", POLYGON_CHAIN_ID)?;
        let targets = UpstreamTargets {
            gamma: target(&get, "GAMMA_API_URL", Upstream::Gamma, chain_id)?,
            data: target(&get, "DATA_API_URL", Upstream::Data, chain_id)?,
            clob: target(&get, "CLOB_API_URL", Upstream::Clob, chain_id)?,
        };

        let credential_fallback = CredentialFallback {
            key: get("POLYMARKET_KEY"),
            funder: get("POLYMARKET_FUNDER"),
        };

        Ok(Self {
            port,
            mode,
            cache,
            upstream_timeout,
            targets,
            credential_fallback,
        })
    }
}

fn parse_or<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

fn positive_or<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialOrd,
{
    let value = parse_or(get, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::NotPositive { var });
    }
    Ok(value)
}

fn target<G>(
    get: &G,
    var: &'static str,
    upstream: Upstream,
    chain_id: u64,
) -> Result<UpstreamTarget, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let base_url = match get(var) {
        Some(value) => {
            let parsed = url::Url::parse(&value).map_err(|_| ConfigError::Invalid {
                var,
                value: value.clone(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid { var, value });
            }
            value
        }
        None => upstream.default_base_url().to_string(),
    };

    Ok(UpstreamTarget::new(upstream, base_url, chain_id))
}

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    NotPositive { var: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.mode, RuntimeMode::Development);
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.cache.ttl, Duration::from_secs(1800));
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.targets.clob.base_url, "https://clob.polymarket.com");
        assert_eq!(config.targets.clob.chain_id, 137);
        assert!(config.credential_fallback.key.is_none());
    }

    #[test]
    fn test_env_defaults_match_library_defaults() {
        let config = load(&[]).unwrap();
        let defaults = GatewayConfig::default();
        assert_eq!(config.cache.max_size, defaults.cache.max_size);
        assert_eq!(config.cache.ttl, defaults.cache.ttl);
        assert_eq!(config.cache.sweep_interval, defaults.cache.sweep_interval);
        assert_eq!(config.upstream_timeout, defaults.upstream_timeout);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SERVER_PORT", "8080"),
            ("GATEWAY_ENV", "production"),
            ("CLIENT_CACHE_MAX_SIZE", "5"),
            ("CLIENT_CACHE_TTL_SECS", "60"),
            ("CLOB_API_URL", "http://localhost:9000/"),
            ("POLYGON_CHAIN_ID", "80002"),
            ("POLYMARKET_FUNDER", " 0xabc "),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.mode.is_production());
        assert_eq!(config.cache.max_size, 5);
        assert_eq!(config.cache.ttl, Duration::from_secs(60));
        assert_eq!(config.targets.clob.base_url, "http://localhost:9000");
        assert_eq!(config.targets.gamma.chain_id, 80002);
        assert_eq!(config.credential_fallback.funder.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_invalid_number() {
        assert_eq!(
            load(&[("SERVER_PORT", "http")]).unwrap_err(),
            ConfigError::Invalid {
                var: "SERVER_PORT",
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            load(&[("CLIENT_CACHE_MAX_SIZE", "0")]).unwrap_err(),
            ConfigError::NotPositive {
                var: "CLIENT_CACHE_MAX_SIZE"
            }
        );
    }

    #[test]
    fn test_bad_upstream_url() {
        assert!(matches!(
            load(&[("GAMMA_API_URL", "ftp://gamma")]),
            Err(ConfigError::Invalid { var: "GAMMA_API_URL", .. })
        ));
        assert!(load(&[("DATA_API_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("SERVER_PORT", "  "), ("POLYMARKET_KEY", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.credential_fallback.key.is_none());
    }
}
