//! Stellar network client boundary for the OGC airdrop tools
//!
//! This crate owns everything that talks to (or reasons about) the Stellar
//! network: address format rules, the `HorizonClient` trait the pipeline is
//! written against, a reqwest-backed Horizon implementation, and the bounded
//! retry helper used around every network call.
//!
//! The pipeline never constructs transactions itself. Envelope signing is
//! delegated through the `TransactionSigner` boundary so no key material or
//! signature primitives live in this workspace.

pub mod address;
pub mod client;
pub mod error;
pub mod horizon;
pub mod retry;

pub use address::address_is_well_formed;
pub use client::{
    Amount, AssetRef, FallbackClient, HorizonClient, NullClient, PaymentRequest, SignedEnvelope,
    TransactionSigner, STROOPS_PER_TOKEN,
};
pub use error::{Result, StellarError};
pub use horizon::HorizonHttpClient;
pub use retry::{with_retry, RetryPolicy};

/// Render a stroop amount as a 7-decimal token string, e.g. `2.5000000`.
pub fn format_stroops(stroops: Amount) -> String {
    format!(
        "{}.{:07}",
        stroops / STROOPS_PER_TOKEN,
        stroops % STROOPS_PER_TOKEN
    )
}

/// Parse a decimal token amount into stroops.
///
/// Accepts up to 7 fractional digits, the network's full precision. Returns
/// `None` for anything else so callers reject rather than silently round.
pub fn parse_stroops(value: &str) -> Option<Amount> {
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (value, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 7 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let frac_stroops: Amount = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<7}");
        padded.parse().ok()?
    };

    whole
        .checked_mul(STROOPS_PER_TOKEN)?
        .checked_add(frac_stroops)
}
