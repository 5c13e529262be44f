//! CLOB authentication
//!
//! Two levels:
//! 1. L1: an EIP-712 `ClobAuth` signature by the trading key, used only to
//!    derive or create API credentials
//! 2. L2: HMAC-SHA256 over `{timestamp}{method}{path}{body}` with the API
//!    secret, sent on every authenticated request

use alloy::primitives::{Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::sol;
use alloy::sol_types::{eip712_domain, Eip712Domain, SolStruct};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD},
    Engine as _,
};
use gateway_core::{GatewayError, GatewayResult};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use sha2::Sha256;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

const HEADER_ADDRESS: &str = "poly_address";
const HEADER_SIGNATURE: &str = "poly_signature";
const HEADER_TIMESTAMP: &str = "poly_timestamp";
const HEADER_NONCE: &str = "poly_nonce";
const HEADER_API_KEY: &str = "poly_api_key";
const HEADER_PASSPHRASE: &str = "poly_passphrase";

/// The fixed message for CLOB auth
const CLOB_AUTH_MESSAGE: &str = "This message attests that I control the given wallet";

type HmacSha256 = Hmac<Sha256>;

// "address address;" yields the type hash
// ClobAuth(address address,string timestamp,uint256 nonce,string message)
sol! {
    struct ClobAuth {
        address address;
        string timestamp;
        uint256 nonce;
        string message;
    }
}

fn clob_auth_domain(chain_id: u64) -> Eip712Domain {
    eip712_domain! {
        name: "ClobAuthDomain",
        version: "1",
        chain_id: chain_id,
    }
}

/// Current unix time in seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ============================================================================
// L1
// ============================================================================

/// Signing key for L1 authentication
#[derive(Clone)]
pub struct L1Signer {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl L1Signer {
    /// Load from a hex private key, with or without `0x`
    pub fn from_private_key(private_key: &str, chain_id: u64) -> GatewayResult<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        // Parse errors are not echoed: they could quote key material
        let key_bytes = B256::from_str(key).map_err(|_| {
            GatewayError::validation("Invalid x-polymarket-key: expected a 32-byte hex private key")
        })?;
        let signer = PrivateKeySigner::from_bytes(&key_bytes).map_err(|_| {
            GatewayError::validation("Invalid x-polymarket-key: not a valid secp256k1 private key")
        })?;

        Ok(Self { signer, chain_id })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Checksummed signer address
    pub fn address_string(&self) -> String {
        self.address().to_checksum(None)
    }

    /// Sign a `ClobAuth` struct, returning a 0x-prefixed 65-byte signature
    pub async fn sign_clob_auth(&self, timestamp: u64, nonce: u64) -> GatewayResult<String> {
        let clob_auth = ClobAuth {
            address: self.address(),
            timestamp: timestamp.to_string(),
            nonce: U256::from(nonce),
            message: CLOB_AUTH_MESSAGE.to_string(),
        };

        let signing_hash = clob_auth.eip712_signing_hash(&clob_auth_domain(self.chain_id));

        let signature = self
            .signer
            .sign_hash(&signing_hash)
            .await
            .map_err(|e| GatewayError::auth(format!("Failed to sign ClobAuth: {}", e)))?;

        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    /// Headers for `/auth/*` key management endpoints
    pub async fn l1_headers(&self, nonce: u64) -> GatewayResult<HeaderMap> {
        let timestamp = current_timestamp();
        let signature = self.sign_clob_auth(timestamp, nonce).await?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, HEADER_ADDRESS, &self.address_string())?;
        insert_header(&mut headers, HEADER_SIGNATURE, &signature)?;
        insert_header(&mut headers, HEADER_TIMESTAMP, &timestamp.to_string())?;
        insert_header(&mut headers, HEADER_NONCE, &nonce.to_string())?;
        Ok(headers)
    }
}

impl std::fmt::Debug for L1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("L1Signer")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

// ============================================================================
// L2
// ============================================================================

/// API credentials returned by derive/create
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl ApiCredentials {
    /// HMAC signature for a request
    ///
    /// The secret is base64 (URL-safe or standard, padding optional). The
    /// signature is URL-safe base64 with padding.
    pub fn sign(&self, timestamp: u64, method: &str, path: &str, body: &str) -> GatewayResult<String> {
        let secret_bytes = URL_SAFE
            .decode(&self.secret)
            .or_else(|_| URL_SAFE_NO_PAD.decode(&self.secret))
            .or_else(|_| STANDARD.decode(&self.secret))
            .map_err(|_| GatewayError::auth("API secret is not valid base64"))?;

        let mut mac = HmacSha256::new_from_slice(&secret_bytes)
            .map_err(|e| GatewayError::auth(format!("Failed to create HMAC: {}", e)))?;
        mac.update(format!("{}{}{}{}", timestamp, method, path, body).as_bytes());

        Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
    }

    /// Headers for an L2-authenticated request
    ///
    /// `path` excludes the query string.
    pub fn l2_headers(
        &self,
        address: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> GatewayResult<HeaderMap> {
        let timestamp = current_timestamp();
        let signature = self.sign(timestamp, method, path, body)?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, HEADER_ADDRESS, address)?;
        insert_header(&mut headers, HEADER_SIGNATURE, &signature)?;
        insert_header(&mut headers, HEADER_TIMESTAMP, &timestamp.to_string())?;
        insert_header(&mut headers, HEADER_API_KEY, &self.api_key)?;
        insert_header(&mut headers, HEADER_PASSPHRASE, &self.passphrase)?;
        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> GatewayResult<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| GatewayError::internal(format!("Invalid value for header {}", name)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key, never funded
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn creds(secret: &str) -> ApiCredentials {
        ApiCredentials {
            api_key: "key-123".to_string(),
            secret: secret.to_string(),
            passphrase: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_signer_from_private_key() {
        let signer = L1Signer::from_private_key(TEST_KEY, 137).unwrap();
        assert_eq!(
            signer.address_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );

        let without_prefix = L1Signer::from_private_key(&TEST_KEY[2..], 137).unwrap();
        assert_eq!(signer.address(), without_prefix.address());
    }

    #[test]
    fn test_invalid_private_key_is_validation() {
        let err = L1Signer::from_private_key("0x1234", 137).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(!err.to_string().contains("1234"));
    }

    #[tokio::test]
    async fn test_sign_clob_auth() {
        let signer = L1Signer::from_private_key(TEST_KEY, 137).unwrap();
        let signature = signer.sign_clob_auth(1700000000, 0).await.unwrap();
        assert!(signature.starts_with("0x"));
        // 65 bytes = 130 hex chars + "0x" prefix
        assert_eq!(signature.len(), 132);

        // Deterministic (RFC 6979)
        assert_eq!(signature, signer.sign_clob_auth(1700000000, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_chain_id_changes_signature() {
        let polygon = L1Signer::from_private_key(TEST_KEY, 137).unwrap();
        let amoy = L1Signer::from_private_key(TEST_KEY, 80002).unwrap();
        assert_ne!(
            polygon.sign_clob_auth(1700000000, 0).await.unwrap(),
            amoy.sign_clob_auth(1700000000, 0).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_l1_headers_present() {
        let signer = L1Signer::from_private_key(TEST_KEY, 137).unwrap();
        let headers = signer.l1_headers(0).await.unwrap();
        for name in [HEADER_ADDRESS, HEADER_SIGNATURE, HEADER_TIMESTAMP, HEADER_NONCE] {
            assert!(headers.contains_key(name), "missing {}", name);
        }
        assert_eq!(headers.get(HEADER_NONCE).unwrap(), "0");
    }

    #[test]
    fn test_hmac_signature_shape() {
        let signature = creds("c2VjcmV0LXNlY3JldC1zZWNyZXQ=")
            .sign(1700000000, "GET", "/data/orders", "")
            .unwrap();
        // 32-byte digest, padded URL-safe base64
        assert_eq!(signature.len(), 44);
        assert!(signature.ends_with('='));
        assert!(!signature.contains('+') && !signature.contains('/'));
    }

    #[test]
    fn test_hmac_accepts_either_alphabet() {
        // 0xfb 0xff encodes differently in the two alphabets
        let url_safe = creds("-_8=").sign(1, "GET", "/data/trades", "").unwrap();
        let standard = creds("+/8=").sign(1, "GET", "/data/trades", "").unwrap();
        assert_eq!(url_safe, standard);
    }

    #[test]
    fn test_hmac_depends_on_request() {
        let c = creds("c2VjcmV0");
        assert_ne!(
            c.sign(1, "GET", "/data/orders", "").unwrap(),
            c.sign(1, "GET", "/data/trades", "").unwrap()
        );
        assert_ne!(
            c.sign(1, "GET", "/data/orders", "").unwrap(),
            c.sign(2, "GET", "/data/orders", "").unwrap()
        );
    }

    #[test]
    fn test_bad_secret_is_auth_error() {
        let err = creds("not base64 !!").sign(1, "GET", "/", "").unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", creds("c2VjcmV0"));
        assert!(!rendered.contains("c2VjcmV0"));
        assert!(!rendered.contains("hunter2"));
    }
}
