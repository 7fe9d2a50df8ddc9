//! Bounded retry for network calls
//!
//! Every Horizon call site composes this helper around itself instead of
//! hand-rolling loops. Only errors classified transient are retried; a
//! definitive network answer returns on the first attempt.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::error::Result;

/// Retry configuration: total attempt count and initial backoff.
///
/// The backoff doubles after each failed attempt. `attempts = 1` means no
/// retries at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 500,
        }
    }
}

/// Run `op`, retrying transient failures up to the policy's attempt budget.
///
/// Returns the first success, the first non-transient error, or the last
/// transient error once the budget is exhausted. Each retry is logged at
/// WARN so infrastructure trouble is visible even when a later attempt
/// succeeds.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut delay = Duration::from_millis(policy.backoff_ms);
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                warn!(
                    attempt,
                    attempts,
                    error = %err,
                    "{label} failed transiently, retrying in {delay:?}"
                );
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
