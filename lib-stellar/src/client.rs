//! Client boundary types and traits
//!
//! `HorizonClient` is the seam between the pipeline and the network. The
//! production implementation is `horizon::HorizonHttpClient`; tests and dry
//! runs substitute their own.
//!
//! All amounts are integer stroops. One token is 10^7 stroops, the smallest
//! payable unit on the network, so arithmetic stays exact end to end.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token amount in stroops (10^-7 of a token).
pub type Amount = u64;

/// Stroops per whole token.
pub const STROOPS_PER_TOKEN: Amount = 10_000_000;

/// A non-native asset, identified by code and issuing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub code: String,
    pub issuer: String,
}

impl AssetRef {
    pub fn new(code: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            issuer: issuer.into(),
        }
    }
}

/// A single payment to submit to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub source: String,
    pub destination: String,
    pub asset: AssetRef,
    pub amount: Amount,
    pub memo: Option<String>,
}

/// A base64 transaction envelope produced by a signer.
#[derive(Debug, Clone)]
pub struct SignedEnvelope(pub String);

/// Envelope signing boundary.
///
/// Key handling and signature primitives live behind this trait, outside the
/// workspace. The pipeline hands over a payment and a source sequence number
/// and receives an envelope ready for submission.
pub trait TransactionSigner: Send + Sync {
    fn sign_payment(&self, request: &PaymentRequest, sequence: u64) -> Result<SignedEnvelope>;
}

/// Read and submit operations against the network.
#[async_trait]
pub trait HorizonClient: Send + Sync {
    /// Whether the account exists on the network.
    async fn account_exists(&self, address: &str) -> Result<bool>;

    /// Whether the account holds a trustline for the asset.
    async fn has_trustline(&self, address: &str, asset: &AssetRef) -> Result<bool>;

    /// Submit a payment, returning the network transaction reference.
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String>;
}

/// Ordered-fallback composition of clients.
///
/// Every call walks the list in order and moves to the next entry only on
/// a transient failure; a definitive answer (found, not found, rejected)
/// returns immediately. This replaces any dynamic backend discovery with
/// one explicit, configured list.
pub struct FallbackClient {
    clients: Vec<std::sync::Arc<dyn HorizonClient>>,
}

impl FallbackClient {
    pub fn new(clients: Vec<std::sync::Arc<dyn HorizonClient>>) -> Self {
        Self { clients }
    }
}

macro_rules! try_each_client {
    ($self:ident, $call:ident ( $($arg:expr),* )) => {{
        let mut last = None;
        for client in &$self.clients {
            match client.$call($($arg),*).await {
                Err(err) if err.is_transient() => {
                    tracing::warn!(error = %err, "client failed transiently, trying next");
                    last = Some(err);
                }
                other => return other,
            }
        }
        Err(last.unwrap_or_else(|| {
            crate::error::StellarError::Transient("no client configured".to_string())
        }))
    }};
}

#[async_trait]
impl HorizonClient for FallbackClient {
    async fn account_exists(&self, address: &str) -> Result<bool> {
        try_each_client!(self, account_exists(address))
    }

    async fn has_trustline(&self, address: &str, asset: &AssetRef) -> Result<bool> {
        try_each_client!(self, has_trustline(address, asset))
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String> {
        try_each_client!(self, submit_payment(request))
    }
}

/// Client for dry runs: answers every read positively and accepts every
/// payment without touching the network.
#[derive(Debug, Default)]
pub struct NullClient;

#[async_trait]
impl HorizonClient for NullClient {
    async fn account_exists(&self, _address: &str) -> Result<bool> {
        Ok(true)
    }

    async fn has_trustline(&self, _address: &str, _asset: &AssetRef) -> Result<bool> {
        Ok(true)
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String> {
        Ok(format!("dry-run:{}", &request.destination[..8.min(request.destination.len())]))
    }
}
