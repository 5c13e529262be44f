//! CLOB API client
//!
//! A `ClobClient` is bound to one trading key, one funder address and one
//! egress proxy. Building it performs the L1 handshake that yields the L2 API
//! credentials, which is why these clients are worth caching.

use alloy::primitives::Address;
use gateway_core::{
    GatewayError, GatewayResult, NormalizedHistoryQuery, ProxyDescriptor, TradingCredentials,
    UpstreamTarget,
};
use reqwest::Client;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::auth::{ApiCredentials, L1Signer};
use crate::http::{build_http_client, read_json, transport_error, HttpSettings, QueryPairs};

/// Nonce used for API key derivation; keys created with nonce 0 are the default set
const API_KEY_NONCE: u64 = 0;

/// Polymarket CLOB client with derived L2 credentials
pub struct ClobClient {
    client: Client,
    base_url: String,
    signer: L1Signer,
    funder: Address,
    api_credentials: ApiCredentials,
}

impl ClobClient {
    /// Build a client and derive (or create) its API credentials
    #[instrument(skip_all, fields(base = %target.base_url))]
    pub async fn connect(
        target: &UpstreamTarget,
        credentials: &TradingCredentials,
        settings: &HttpSettings,
        proxy: Option<&ProxyDescriptor>,
    ) -> GatewayResult<Self> {
        let signer = L1Signer::from_private_key(credentials.secret(), target.chain_id)?;
        let funder = parse_funder(credentials.delegate_address())?;
        let client = build_http_client(settings, proxy)?;

        info!(
            "Connecting CLOB client for signer {} (funder {})",
            signer.address_string(),
            funder
        );

        let api_credentials = derive_or_create_api_key(&client, &target.base_url, &signer).await?;

        Ok(Self {
            client,
            base_url: target.base_url.clone(),
            signer,
            funder,
            api_credentials,
        })
    }

    /// Assemble a client from credentials that were already derived
    pub fn with_api_credentials(
        target: &UpstreamTarget,
        credentials: &TradingCredentials,
        settings: &HttpSettings,
        proxy: Option<&ProxyDescriptor>,
        api_credentials: ApiCredentials,
    ) -> GatewayResult<Self> {
        Ok(Self {
            client: build_http_client(settings, proxy)?,
            base_url: target.base_url.clone(),
            signer: L1Signer::from_private_key(credentials.secret(), target.chain_id)?,
            funder: parse_funder(credentials.delegate_address())?,
            api_credentials,
        })
    }

    /// Signer address (checksummed)
    pub fn address(&self) -> String {
        self.signer.address_string()
    }

    /// Address holding the funds the signer trades for
    pub fn funder(&self) -> Address {
        self.funder
    }

    // ========================================================================
    // Public market data
    // ========================================================================

    /// Historical prices for a token
    #[instrument(skip(self))]
    pub async fn prices_history(&self, query: &NormalizedHistoryQuery) -> GatewayResult<Value> {
        self.get_public("/prices-history", &query.to_query_pairs()).await
    }

    /// Full order book for a token
    #[instrument(skip(self))]
    pub async fn order_book(&self, token_id: &str) -> GatewayResult<Value> {
        let token_id = require_token_id(token_id)?;
        self.get_public("/book", &[("token_id", token_id)]).await
    }

    /// Best price on one side of the book
    #[instrument(skip(self))]
    pub async fn price(&self, token_id: &str, side: &str) -> GatewayResult<Value> {
        let token_id = require_token_id(token_id)?;
        let side = normalize_side(side)?;
        self.get_public("/price", &[("token_id", token_id), ("side", side)])
            .await
    }

    #[instrument(skip(self))]
    pub async fn midpoint(&self, token_id: &str) -> GatewayResult<Value> {
        let token_id = require_token_id(token_id)?;
        self.get_public("/midpoint", &[("token_id", token_id)]).await
    }

    #[instrument(skip(self))]
    pub async fn spread(&self, token_id: &str) -> GatewayResult<Value> {
        let token_id = require_token_id(token_id)?;
        self.get_public("/spread", &[("token_id", token_id)]).await
    }

    /// CLOB server time in unix seconds
    pub async fn server_time(&self) -> GatewayResult<Value> {
        self.get_public::<(&str, &str)>("/time", &[]).await
    }

    /// The CLOB answers `GET /` with `"OK"`
    pub async fn health(&self) -> GatewayResult<()> {
        self.get_public::<(&str, &str)>("/", &[]).await.map(|_| ())
    }

    // ========================================================================
    // L2 authenticated
    // ========================================================================

    /// Open orders for the API key
    #[instrument(skip(self, query))]
    pub async fn open_orders(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_authenticated("/data/orders", query).await
    }

    /// Trade history for the API key
    #[instrument(skip(self, query))]
    pub async fn trades(&self, query: &QueryPairs) -> GatewayResult<Value> {
        self.get_authenticated("/data/trades", query).await
    }

    async fn get_public<Q: serde::Serialize>(&self, path: &str, query: &[Q]) -> GatewayResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching CLOB {}", path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error("CLOB request failed", e))?;

        read_json(path, response).await
    }

    async fn get_authenticated(&self, path: &str, query: &QueryPairs) -> GatewayResult<Value> {
        // Signature covers the path only, never the query string
        let headers = self
            .api_credentials
            .l2_headers(&self.address(), "GET", path, "")?;
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching CLOB {} (L2)", path);

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error("CLOB request failed", e))?;

        read_json(path, response).await
    }
}

impl std::fmt::Debug for ClobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClobClient")
            .field("base_url", &self.base_url)
            .field("address", &self.signer.address())
            .field("funder", &self.funder)
            .field("api_key", &self.api_credentials.api_key)
            .finish()
    }
}

// ============================================================================
// API key handshake
// ============================================================================

async fn derive_or_create_api_key(
    client: &Client,
    base_url: &str,
    signer: &L1Signer,
) -> GatewayResult<ApiCredentials> {
    let headers = signer.l1_headers(API_KEY_NONCE).await?;
    let response = client
        .get(format!("{}/auth/derive-api-key", base_url))
        .headers(headers)
        .send()
        .await
        .map_err(|e| transport_error("Failed to derive API key", e))?;

    match read_json("derive API key", response).await {
        Ok(body) => {
            debug!("API key derived for {}", signer.address_string());
            parse_api_credentials(body)
        }
        Err(err) if is_missing_api_key(&err) => {
            info!("No existing API key for {}, creating one", signer.address_string());
            create_api_key(client, base_url, signer).await
        }
        Err(err) => {
            warn!("Failed to derive API key for {}: {}", signer.address_string(), err);
            Err(err)
        }
    }
}

async fn create_api_key(
    client: &Client,
    base_url: &str,
    signer: &L1Signer,
) -> GatewayResult<ApiCredentials> {
    let headers = signer.l1_headers(API_KEY_NONCE).await?;
    let response = client
        .post(format!("{}/auth/api-key", base_url))
        .headers(headers)
        .send()
        .await
        .map_err(|e| transport_error("Failed to create API key", e))?;

    let body = read_json("create API key", response).await?;
    parse_api_credentials(body)
}

/// Derivation fails this way when the wallet never created a key
fn is_missing_api_key(err: &GatewayError) -> bool {
    match err {
        GatewayError::Upstream {
            status, message, ..
        } => {
            let message = message.to_lowercase();
            *status == Some(404)
                || message.contains("could not derive")
                || message.contains("not found")
        }
        _ => false,
    }
}

fn parse_api_credentials(body: Value) -> GatewayResult<ApiCredentials> {
    serde_json::from_value(body).map_err(|e| {
        GatewayError::parse(format!("Unexpected API key response shape: {}", e))
    })
}

fn parse_funder(address: &str) -> GatewayResult<Address> {
    Address::from_str(address.trim()).map_err(|_| {
        GatewayError::validation(format!("Invalid x-polymarket-funder: {}", address))
    })
}

fn require_token_id(token_id: &str) -> GatewayResult<&str> {
    let token_id = token_id.trim();
    if token_id.is_empty() {
        return Err(GatewayError::validation("Missing required parameter: token_id"));
    }
    Ok(token_id)
}

fn normalize_side(side: &str) -> GatewayResult<&'static str> {
    match side.trim().to_ascii_uppercase().as_str() {
        "BUY" => Ok("BUY"),
        "SELL" => Ok("SELL"),
        _ => Err(GatewayError::validation(format!(
            "Invalid side '{}': must be BUY or SELL",
            side
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::Upstream;
    use serde_json::json;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const FUNDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn api_credentials() -> ApiCredentials {
        ApiCredentials {
            api_key: "00000000-0000-0000-0000-000000000000".to_string(),
            secret: "c2VjcmV0".to_string(),
            passphrase: "pass".to_string(),
        }
    }

    #[test]
    fn test_with_api_credentials() {
        let client = ClobClient::with_api_credentials(
            &UpstreamTarget::polymarket(Upstream::Clob),
            &TradingCredentials::new(TEST_KEY, FUNDER),
            &HttpSettings::default(),
            None,
            api_credentials(),
        )
        .unwrap();

        assert_eq!(
            client.address().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(client.funder(), Address::from_str(FUNDER).unwrap());
        assert!(!format!("{:?}", client).contains("c2VjcmV0"));
    }

    #[test]
    fn test_bad_funder_is_validation() {
        let err = ClobClient::with_api_credentials(
            &UpstreamTarget::polymarket(Upstream::Clob),
            &TradingCredentials::new(TEST_KEY, "0xnothex"),
            &HttpSettings::default(),
            None,
            api_credentials(),
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn test_missing_api_key_detection() {
        assert!(is_missing_api_key(&GatewayError::upstream(Some(404), "")));
        assert!(is_missing_api_key(&GatewayError::upstream(
            Some(400),
            "Could not derive api key!"
        )));
        assert!(!is_missing_api_key(&GatewayError::upstream(
            Some(401),
            "Invalid L1 Request headers"
        )));
        assert!(!is_missing_api_key(&GatewayError::unavailable("timeout")));
    }

    #[test]
    fn test_parse_api_credentials() {
        let creds = parse_api_credentials(json!({
            "apiKey": "k",
            "secret": "s",
            "passphrase": "p"
        }))
        .unwrap();
        assert_eq!(creds.api_key, "k");

        let err = parse_api_credentials(json!({"apiKey": "k"})).unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
    }

    #[test]
    fn test_side_and_token_validation() {
        assert_eq!(normalize_side("buy").unwrap(), "BUY");
        assert_eq!(normalize_side(" SELL ").unwrap(), "SELL");
        assert!(matches!(normalize_side("hold"), Err(GatewayError::Validation(_))));

        assert_eq!(require_token_id(" 123 ").unwrap(), "123");
        assert!(require_token_id("").is_err());
    }
}
