//! Batch payment distribution
//!
//! Walks the approved list in bounded batches, strictly one payment at a
//! time, with configured delays inside and between batches. Immediately
//! before every attempt the tracker is consulted again: an identity that is
//! already paid is skipped without touching the network, which is what makes
//! overlapping or repeated runs safe.
//!
//! A successful payment is persisted before the next submission starts, so
//! a crash mid-batch can lose at most the in-flight attempt. One failed
//! recipient never stops the batch; an underfunded source stops the whole
//! run because every further attempt would fail the same way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use lib_stellar::{
    format_stroops, with_retry, Amount, AssetRef, HorizonClient, PaymentRequest, RetryPolicy,
};
use lib_submissions::Submission;
use lib_tracker::{OutcomeStatus, ProcessedRecord, StateTracker};

use crate::config::{BatchConfig, PayoutPolicy};
use crate::error::Result;
use crate::unix_now;

/// Final status of one payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Sent,
    Failed,
    SkippedDuplicate,
}

/// Outcome of one recipient in a distribution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub recipient: String,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub network_reference: Option<String>,
    pub error: Option<String>,
    pub attempted_at: u64,
}

/// Why a run ended before the list was exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The source account ran out of funds.
    FundsExhausted { recipient: String },
    /// A stop was requested; the in-flight payment was completed first.
    Stopped,
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::FundsExhausted { recipient } => {
                write!(f, "source funds exhausted at recipient {recipient}")
            }
            HaltReason::Stopped => write!(f, "stop requested"),
        }
    }
}

/// Result of a distribution run, partial or complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionOutcome {
    /// One entry per attempted submission, in submission order.
    pub outcomes: Vec<PaymentOutcome>,
    pub halted: Option<HaltReason>,
    /// Submissions never attempted because the run halted early.
    pub unprocessed: usize,
}

/// Sequential batch distributor.
pub struct Distributor {
    client: Arc<dyn HorizonClient>,
    tracker: Arc<dyn StateTracker>,
    asset: AssetRef,
    source_account: String,
    batch: BatchConfig,
    payout: PayoutPolicy,
    retry: RetryPolicy,
}

impl Distributor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn HorizonClient>,
        tracker: Arc<dyn StateTracker>,
        asset: AssetRef,
        source_account: String,
        batch: BatchConfig,
        payout: PayoutPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            tracker,
            asset,
            source_account,
            batch,
            payout,
            retry,
        }
    }

    /// Pay the approved list. Stops cleanly between submissions when the
    /// stop signal flips, and hard-halts on an underfunded source.
    pub async fn run(
        &self,
        approved: &[Submission],
        stop: &watch::Receiver<bool>,
    ) -> Result<DistributionOutcome> {
        let total = approved.len();
        let batch_size = self.batch.batch_size.max(1);
        let batch_count = total.div_ceil(batch_size);
        info!(
            recipients = total,
            batches = batch_count,
            batch_size = self.batch.batch_size,
            "starting distribution"
        );

        let mut outcomes = Vec::with_capacity(total);
        let mut halted = None;
        let mut processed = 0usize;

        'batches: for (batch_index, batch) in approved.chunks(batch_size).enumerate() {
            info!(
                batch = batch_index + 1,
                of = batch_count,
                size = batch.len(),
                "processing batch"
            );

            for (position, submission) in batch.iter().enumerate() {
                if *stop.borrow() {
                    info!("stop requested, halting between submissions");
                    halted = Some(HaltReason::Stopped);
                    break 'batches;
                }

                let (outcome, fatal) = self.pay_one(submission).await?;
                outcomes.push(outcome);
                processed += 1;

                if fatal {
                    halted = Some(HaltReason::FundsExhausted {
                        recipient: submission.address.clone(),
                    });
                    break 'batches;
                }

                // Pace individual transactions; no delay after the last in
                // a batch.
                if position + 1 < batch.len() && self.batch.tx_delay_secs > 0 {
                    sleep(Duration::from_secs(self.batch.tx_delay_secs)).await;
                }
            }

            if batch_index + 1 < batch_count && self.batch.batch_delay_secs > 0 {
                info!(
                    delay_secs = self.batch.batch_delay_secs,
                    "waiting before next batch"
                );
                sleep(Duration::from_secs(self.batch.batch_delay_secs)).await;
            }
        }

        Ok(DistributionOutcome {
            outcomes,
            halted,
            unprocessed: total - processed,
        })
    }

    /// Attempt one payment, recording the outcome in the tracker.
    ///
    /// The boolean marks a funding-exhaustion failure, which must halt the
    /// whole run.
    async fn pay_one(&self, submission: &Submission) -> Result<(PaymentOutcome, bool)> {
        let identity = submission.identity();
        let attempted_at = unix_now();

        // Final dedup gate. A concurrent or earlier run may have paid this
        // identity after validation.
        if let Some(record) = self.tracker.lookup(&identity)? {
            if record.outcome == OutcomeStatus::Paid {
                info!(identity = %identity, "already paid, skipping");
                return Ok((
                    PaymentOutcome {
                        recipient: submission.address.clone(),
                        amount: 0,
                        status: PaymentStatus::SkippedDuplicate,
                        network_reference: record.network_reference,
                        error: None,
                        attempted_at,
                    },
                    false,
                ));
            }
        }

        let amount = self.payout.amount();
        let request = PaymentRequest {
            source: self.source_account.clone(),
            destination: submission.address.clone(),
            asset: self.asset.clone(),
            amount,
            memo: None,
        };

        info!(
            recipient = %submission.address,
            amount = %format_stroops(amount),
            "submitting payment"
        );

        let submitted = with_retry(&self.retry, "payment submission", || {
            self.client.submit_payment(&request)
        })
        .await;

        match submitted {
            Ok(reference) => {
                // Persist before moving on so a crash cannot replay this
                // payment.
                self.tracker.record(ProcessedRecord {
                    identity,
                    outcome: OutcomeStatus::Paid,
                    reason: "payment sent".to_string(),
                    network_reference: Some(reference.clone()),
                    last_attempt_at: attempted_at,
                })?;

                info!(recipient = %submission.address, reference = %reference, "payment sent");
                Ok((
                    PaymentOutcome {
                        recipient: submission.address.clone(),
                        amount,
                        status: PaymentStatus::Sent,
                        network_reference: Some(reference),
                        error: None,
                        attempted_at,
                    },
                    false,
                ))
            }
            Err(err) => {
                self.tracker.record(ProcessedRecord {
                    identity,
                    outcome: OutcomeStatus::PaymentFailed,
                    reason: err.to_string(),
                    network_reference: None,
                    last_attempt_at: attempted_at,
                })?;

                let fatal = err.is_fatal_funding();
                if fatal {
                    error!(recipient = %submission.address, error = %err, "source underfunded");
                } else {
                    warn!(recipient = %submission.address, error = %err, "payment failed");
                }

                Ok((
                    PaymentOutcome {
                        recipient: submission.address.clone(),
                        amount,
                        status: PaymentStatus::Failed,
                        network_reference: None,
                        error: Some(err.to_string()),
                        attempted_at,
                    },
                    fatal,
                ))
            }
        }
    }
}
