//! Pipeline error types
//!
//! Per-submission trouble (rejection, missing prerequisite, payment
//! failure) is data, not an error: it lands in validation results and
//! payment outcomes. This type covers only failures that stop the run.

use thiserror::Error;

use lib_submissions::NormalizeError;
use lib_tracker::TrackerError;

/// Run-stopping pipeline error
#[derive(Error, Debug)]
pub enum AirdropError {
    /// The export stream itself could not be normalized.
    #[error("Malformed input: {0}")]
    MalformedInput(#[from] NormalizeError),

    /// Configuration failed the startup checks.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The state tracker failed. Without it the idempotence guarantee is
    /// gone, so the run stops rather than risking a double payment.
    #[error("State tracker failure: {0}")]
    Tracker(#[from] TrackerError),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AirdropError>;
