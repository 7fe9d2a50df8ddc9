//! Submission validation
//!
//! Checks run in order and stop at the first failure: address format,
//! dedup against the tracker, on-network account existence, then the asset
//! trustline. Format and existence failures are terminal; a missing
//! trustline is not, so a submitter can establish it later and be promoted
//! on the next run without resubmitting.
//!
//! Network reads go through the bounded retry helper. When retries are
//! exhausted the check is treated as failed, but the reason string and a
//! WARN log keep infrastructure trouble distinguishable from a true
//! negative.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use lib_stellar::{address_is_well_formed, with_retry, AssetRef, HorizonClient, RetryPolicy};
use lib_submissions::Submission;
use lib_tracker::{OutcomeStatus, ProcessedRecord, StateTracker};

use crate::error::Result;
use crate::unix_now;

/// Outcome class of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Approved,
    PendingPrerequisite,
    Rejected,
}

/// Result of validating one submission. Immutable once produced for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub submission: Submission,
    pub status: ValidationStatus,
    pub reason: String,
    pub checked_at: u64,
}

/// Validator over a network client and the shared state tracker.
pub struct Validator {
    client: Arc<dyn HorizonClient>,
    tracker: Arc<dyn StateTracker>,
    asset: AssetRef,
    retry: RetryPolicy,
}

impl Validator {
    pub fn new(
        client: Arc<dyn HorizonClient>,
        tracker: Arc<dyn StateTracker>,
        asset: AssetRef,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            tracker,
            asset,
            retry,
        }
    }

    /// Validate one submission and record the outcome in the tracker.
    pub async fn validate(&self, submission: &Submission) -> Result<ValidationResult> {
        let identity = submission.identity();

        // Step 1: format. No network involved, rejects garbage cheaply.
        if !address_is_well_formed(&submission.address) {
            let result = self.finish(
                submission,
                ValidationStatus::Rejected,
                "malformed address",
            )?;
            return Ok(result);
        }

        // Step 2: dedup. Terminal prior outcomes short-circuit; a prior
        // pending record falls through so it can be promoted.
        if let Some(prior) = self.tracker.lookup(&identity)? {
            match prior.outcome {
                OutcomeStatus::Paid => {
                    info!(identity = %identity, "already paid, short-circuiting");
                    return Ok(ValidationResult {
                        submission: submission.clone(),
                        status: ValidationStatus::Approved,
                        reason: "previously paid".to_string(),
                        checked_at: unix_now(),
                    });
                }
                OutcomeStatus::Rejected => {
                    info!(identity = %identity, "previously rejected, short-circuiting");
                    return Ok(ValidationResult {
                        submission: submission.clone(),
                        status: ValidationStatus::Rejected,
                        reason: prior.reason,
                        checked_at: unix_now(),
                    });
                }
                // Pending, approved-but-unpaid, and failed payments are all
                // re-checked against current network state.
                _ => {}
            }
        }

        // Step 3: the account must exist on the network.
        let exists = with_retry(&self.retry, "account lookup", || {
            self.client.account_exists(&submission.address)
        })
        .await;
        match exists {
            Ok(true) => {}
            Ok(false) => {
                return self.finish(submission, ValidationStatus::Rejected, "account not found");
            }
            Err(err) => {
                warn!(
                    address = %submission.address,
                    error = %err,
                    "account lookup failed after retries, rejecting"
                );
                return self.finish(
                    submission,
                    ValidationStatus::Rejected,
                    "account not found (network unavailable)",
                );
            }
        }

        // Step 4: the trustline must be established. Absence is not
        // terminal, and neither is a network failure here: both leave the
        // submission promotable on a later run.
        let trustline = with_retry(&self.retry, "trustline lookup", || {
            self.client.has_trustline(&submission.address, &self.asset)
        })
        .await;
        match trustline {
            Ok(true) => {}
            Ok(false) => {
                return self.finish(
                    submission,
                    ValidationStatus::PendingPrerequisite,
                    "trustline not established",
                );
            }
            Err(err) => {
                warn!(
                    address = %submission.address,
                    error = %err,
                    "trustline lookup failed after retries, leaving pending"
                );
                return self.finish(
                    submission,
                    ValidationStatus::PendingPrerequisite,
                    "trustline check failed (network unavailable)",
                );
            }
        }

        self.finish(submission, ValidationStatus::Approved, "ready for airdrop")
    }

    /// Record the outcome and build the result.
    fn finish(
        &self,
        submission: &Submission,
        status: ValidationStatus,
        reason: &str,
    ) -> Result<ValidationResult> {
        let checked_at = unix_now();
        let outcome = match status {
            ValidationStatus::Approved => OutcomeStatus::Approved,
            ValidationStatus::PendingPrerequisite => OutcomeStatus::PendingPrerequisite,
            ValidationStatus::Rejected => OutcomeStatus::Rejected,
        };

        self.tracker.record(ProcessedRecord {
            identity: submission.identity(),
            outcome,
            reason: reason.to_string(),
            network_reference: None,
            last_attempt_at: checked_at,
        })?;

        Ok(ValidationResult {
            submission: submission.clone(),
            status,
            reason: reason.to_string(),
            checked_at,
        })
    }
}
