//! Horizon REST client
//!
//! Thin wrapper over the Horizon HTTP API. Read calls hit `/accounts/{id}`;
//! submission posts a signed envelope to `/transactions`. Responses are
//! mapped onto the error taxonomy in `error.rs` so the retry helper can tell
//! infrastructure trouble from definitive answers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::client::{AssetRef, HorizonClient, PaymentRequest, TransactionSigner};
use crate::error::{Result, StellarError};

/// Well-known public Horizon endpoints.
pub const HORIZON_PUBLIC: &str = "https://horizon.stellar.org";
pub const HORIZON_TESTNET: &str = "https://horizon-testnet.stellar.org";

/// reqwest-backed Horizon client with a per-request timeout.
pub struct HorizonHttpClient {
    http: reqwest::Client,
    base_url: String,
    signer: Arc<dyn TransactionSigner>,
}

impl HorizonHttpClient {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        signer: Arc<dyn TransactionSigner>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| StellarError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Fetch the account record, or `None` when Horizon answers 404.
    async fn fetch_account(&self, address: &str) -> Result<Option<Value>> {
        let url = format!("{}/accounts/{}", self.base_url, address);
        debug!(%url, "horizon account lookup");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            let body: Value = response.json().await?;
            return Ok(Some(body));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(StellarError::Transient(format!(
                "horizon returned {status} for account lookup"
            )));
        }
        Err(StellarError::Http(format!(
            "horizon returned {status} for account lookup"
        )))
    }
}

#[async_trait]
impl HorizonClient for HorizonHttpClient {
    async fn account_exists(&self, address: &str) -> Result<bool> {
        Ok(self.fetch_account(address).await?.is_some())
    }

    async fn has_trustline(&self, address: &str, asset: &AssetRef) -> Result<bool> {
        let account = self
            .fetch_account(address)
            .await?
            .ok_or_else(|| StellarError::NotFound(address.to_string()))?;

        Ok(account_holds_trustline(&account, asset))
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String> {
        let source = self
            .fetch_account(&request.source)
            .await?
            .ok_or_else(|| StellarError::NotFound(request.source.clone()))?;
        let sequence = parse_sequence(&source)?;

        let envelope = self.signer.sign_payment(request, sequence)?;

        let url = format!("{}/transactions", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[("tx", envelope.0.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .unwrap_or(Value::Null);

        if status.is_success() {
            return body
                .get("hash")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    StellarError::Malformed("transaction response missing hash".into())
                });
        }

        Err(classify_submit_failure(status.as_u16(), &body))
    }
}

/// Scan an account's balances for a matching trustline entry.
fn account_holds_trustline(account: &Value, asset: &AssetRef) -> bool {
    let Some(balances) = account.get("balances").and_then(Value::as_array) else {
        return false;
    };

    balances.iter().any(|balance| {
        balance.get("asset_code").and_then(Value::as_str) == Some(asset.code.as_str())
            && balance.get("asset_issuer").and_then(Value::as_str) == Some(asset.issuer.as_str())
    })
}

/// Horizon serves the sequence number as a decimal string.
fn parse_sequence(account: &Value) -> Result<u64> {
    account
        .get("sequence")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| StellarError::Malformed("account record missing sequence".into()))
}

/// Map a failed submission response onto the error taxonomy.
///
/// An underfunded source must surface as its own class so the distributor
/// can halt the run instead of burning through the rest of the batch.
fn classify_submit_failure(status: u16, body: &Value) -> StellarError {
    let result_codes = body
        .get("extras")
        .and_then(|extras| extras.get("result_codes"));

    if let Some(codes) = result_codes {
        let tx_code = codes
            .get("transaction")
            .and_then(Value::as_str)
            .unwrap_or("");
        let op_underfunded = codes
            .get("operations")
            .and_then(Value::as_array)
            .map(|ops| {
                ops.iter()
                    .any(|op| op.as_str() == Some("op_underfunded"))
            })
            .unwrap_or(false);

        if tx_code == "tx_insufficient_balance" || op_underfunded {
            return StellarError::Underfunded(format!("horizon result codes: {codes}"));
        }
        if status < 500 {
            return StellarError::BadRequest(format!("horizon result codes: {codes}"));
        }
    }

    if status >= 500 || status == 429 {
        StellarError::Transient(format!("horizon returned {status} on submission"))
    } else {
        StellarError::BadRequest(format!("horizon returned {status} on submission"))
    }
}
