//! Error types for the Stellar client boundary
//!
//! The pipeline retries only `Transient` errors. Everything else is a
//! definitive answer from the network and must surface as-is.

use thiserror::Error;

/// Stellar client error type
#[derive(Error, Debug, Clone)]
pub enum StellarError {
    /// Timeout, connection failure, or 5xx from Horizon. Retryable.
    #[error("Transient network error: {0}")]
    Transient(String),

    /// The queried account does not exist on the network.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// The source account cannot cover the payment. Halts the run.
    #[error("Source account underfunded: {0}")]
    Underfunded(String),

    /// Horizon rejected the request as invalid. Not retryable.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unexpected HTTP failure outside the classes above.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body could not be interpreted.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Envelope signing failed at the signer boundary.
    #[error("Signing error: {0}")]
    Signing(String),
}

impl StellarError {
    /// Whether a bounded retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(self, StellarError::Transient(_))
    }

    /// Whether this error must stop the whole distribution run.
    pub fn is_fatal_funding(&self) -> bool {
        matches!(self, StellarError::Underfunded(_))
    }
}

impl From<reqwest::Error> for StellarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            StellarError::Transient(err.to_string())
        } else {
            StellarError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StellarError {
    fn from(err: serde_json::Error) -> Self {
        StellarError::Malformed(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, StellarError>;
