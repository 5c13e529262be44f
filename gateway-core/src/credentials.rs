//! Trading credential resolution
//!
//! The CLOB upstream needs a signing key and the funder (delegate) address the
//! key trades on behalf of. Both normally arrive as request headers; outside
//! production they may fall back to process configuration.

use std::fmt;

use crate::error::{GatewayError, GatewayResult};

/// Header carrying the hex-encoded signing key
pub const KEY_HEADER: &str = "x-polymarket-key";

/// Header carrying the funder / delegate address
pub const FUNDER_HEADER: &str = "x-polymarket-funder";

/// Runtime mode, controls whether configuration fallback is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Production,
    #[default]
    Development,
}

impl RuntimeMode {
    /// `production` / `prod` (any case) selects production, anything else development
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => RuntimeMode::Production,
            _ => RuntimeMode::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeMode::Production)
    }
}

/// Raw credential header values as received
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHeaders<'a> {
    pub key: Option<&'a str>,
    pub funder: Option<&'a str>,
}

/// Process-level credentials used when headers are absent (non-production only)
#[derive(Clone, Default)]
pub struct CredentialFallback {
    pub key: Option<String>,
    pub funder: Option<String>,
}

impl fmt::Debug for CredentialFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialFallback")
            .field("has_key", &self.key.is_some())
            .field("funder", &self.funder)
            .finish()
    }
}

/// Resolved credentials for one request
#[derive(Clone, PartialEq, Eq)]
pub struct TradingCredentials {
    secret: String,
    delegate_address: String,
}

impl TradingCredentials {
    pub fn new(secret: impl Into<String>, delegate_address: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            delegate_address: delegate_address.into(),
        }
    }

    /// Signing secret (hex private key). Never log this.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Funder / delegate address the key acts for
    pub fn delegate_address(&self) -> &str {
        &self.delegate_address
    }
}

impl fmt::Debug for TradingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradingCredentials")
            .field("secret", &"***")
            .field("delegate_address", &self.delegate_address)
            .finish()
    }
}

/// Resolve trading credentials from headers, with configuration fallback outside production
pub fn resolve_credentials(
    headers: CredentialHeaders<'_>,
    mode: RuntimeMode,
    fallback: &CredentialFallback,
) -> GatewayResult<TradingCredentials> {
    let header_key = non_blank(headers.key);
    let header_funder = non_blank(headers.funder);

    let (key, funder) = if mode.is_production() {
        (header_key, header_funder)
    } else {
        (
            header_key.or_else(|| non_blank(fallback.key.as_deref())),
            header_funder.or_else(|| non_blank(fallback.funder.as_deref())),
        )
    };

    let missing: Vec<&str> = [(KEY_HEADER, key.is_none()), (FUNDER_HEADER, funder.is_none())]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

    match (key, funder) {
        (Some(key), Some(funder)) => {
            validate_address(funder)?;
            Ok(TradingCredentials::new(key, funder))
        }
        _ => Err(GatewayError::validation(format!(
            "Missing required header{}: {}",
            if missing.len() > 1 { "s" } else { "" },
            missing.join(", ")
        ))),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate_address(address: &str) -> GatewayResult<()> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or("");

    if hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(GatewayError::validation(format!(
            "Invalid {} header: expected a 0x-prefixed 20-byte hex address",
            FUNDER_HEADER
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const FUNDER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn fallback() -> CredentialFallback {
        CredentialFallback {
            key: Some(KEY.to_string()),
            funder: Some(FUNDER.to_string()),
        }
    }

    #[test]
    fn test_production_requires_headers() {
        let err = resolve_credentials(
            CredentialHeaders { key: Some(KEY), funder: None },
            RuntimeMode::Production,
            &fallback(),
        )
        .unwrap_err();

        match err {
            GatewayError::Validation(msg) => assert!(msg.contains(FUNDER_HEADER)),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_production_names_both_missing_headers() {
        let err = resolve_credentials(
            CredentialHeaders::default(),
            RuntimeMode::Production,
            &CredentialFallback::default(),
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains(KEY_HEADER));
        assert!(msg.contains(FUNDER_HEADER));
    }

    #[test]
    fn test_development_falls_back_to_config() {
        let creds = resolve_credentials(
            CredentialHeaders::default(),
            RuntimeMode::Development,
            &fallback(),
        )
        .unwrap();
        assert_eq!(creds.secret(), KEY);
        assert_eq!(creds.delegate_address(), FUNDER);
    }

    #[test]
    fn test_headers_take_precedence() {
        let other_funder = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        let creds = resolve_credentials(
            CredentialHeaders { key: None, funder: Some(other_funder) },
            RuntimeMode::Development,
            &fallback(),
        )
        .unwrap();
        assert_eq!(creds.secret(), KEY);
        assert_eq!(creds.delegate_address(), other_funder);
    }

    #[test]
    fn test_development_without_any_source_fails() {
        let result = resolve_credentials(
            CredentialHeaders { key: Some("  "), funder: None },
            RuntimeMode::Development,
            &CredentialFallback::default(),
        );
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[test]
    fn test_rejects_malformed_funder() {
        let result = resolve_credentials(
            CredentialHeaders { key: Some(KEY), funder: Some("0x1234") },
            RuntimeMode::Production,
            &CredentialFallback::default(),
        );
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let creds = TradingCredentials::new(KEY, FUNDER);
        assert!(!format!("{:?}", creds).contains("ac0974"));
    }

    #[test]
    fn test_runtime_mode_from_env() {
        assert_eq!(RuntimeMode::from_env_value("Production"), RuntimeMode::Production);
        assert_eq!(RuntimeMode::from_env_value("prod"), RuntimeMode::Production);
        assert_eq!(RuntimeMode::from_env_value("staging"), RuntimeMode::Development);
    }
}
