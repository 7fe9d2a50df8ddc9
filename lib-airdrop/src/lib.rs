//! Airdrop validation and distribution pipeline
//!
//! The core of the OGC airdrop tools: submissions flow from the normalizer
//! through the validator (consulting the state tracker for dedup), approved
//! recipients through the batch distributor (marking paid identities in the
//! tracker), and the run closes with the fund allocation and an aggregate
//! report. Rejected and pending entries are recorded but never paid in the
//! same run.
//!
//! Payment issuance is strictly sequential. Ordering and rate limiting are
//! correctness requirements here, not tuning: the destination network
//! throttles bursts and the tracker must observe writes in submission
//! order.

pub mod config;
pub mod distribute;
pub mod error;
pub mod fund;
pub mod pipeline;
pub mod report;
pub mod validate;

pub use config::{
    AirdropConfig, AssetConfig, BatchConfig, FundCategory, FundPolicy, NetworkEnv, PayoutPolicy,
};
pub use distribute::{
    DistributionOutcome, Distributor, HaltReason, PaymentOutcome, PaymentStatus,
};
pub use error::{AirdropError, Result};
pub use fund::{allocate, CategoryAmount, FundAllocation};
pub use pipeline::{Pipeline, PipelineRun};
pub use report::{summarize, RunReport};
pub use validate::{ValidationResult, ValidationStatus, Validator};

/// Current unix time in seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
