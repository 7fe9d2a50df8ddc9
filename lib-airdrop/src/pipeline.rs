//! Pipeline orchestration
//!
//! Wires the stages together around one shared tracker handle:
//! normalize, validate, distribute, allocate, report. Rejected and pending
//! submissions stop after validation; only approved ones reach the
//! distributor. A report is produced even when distribution halts early.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use lib_stellar::HorizonClient;
use lib_submissions::{normalize_export, NormalizedBatch};
use lib_tracker::StateTracker;

use crate::config::AirdropConfig;
use crate::distribute::{DistributionOutcome, Distributor, PaymentStatus};
use crate::error::Result;
use crate::fund::{allocate, FundAllocation};
use crate::report::{summarize, RunReport};
use crate::unix_now;
use crate::validate::{ValidationResult, ValidationStatus, Validator};

/// Everything one full run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub validations: Vec<ValidationResult>,
    pub distribution: DistributionOutcome,
    pub allocation: FundAllocation,
    pub report: RunReport,
}

/// The full submission-to-report pipeline.
pub struct Pipeline {
    client: Arc<dyn HorizonClient>,
    tracker: Arc<dyn StateTracker>,
    config: AirdropConfig,
}

impl Pipeline {
    /// Build a pipeline, failing fast on an inconsistent configuration.
    pub fn new(
        client: Arc<dyn HorizonClient>,
        tracker: Arc<dyn StateTracker>,
        config: AirdropConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client,
            tracker,
            config,
        })
    }

    /// Normalize and validate an export without paying anyone.
    ///
    /// Backs the standalone validation command and the first half of a full
    /// run.
    pub async fn validate_export(
        &self,
        raw_export: &[u8],
    ) -> Result<(Vec<ValidationResult>, NormalizedBatch)> {
        let batch = normalize_export(raw_export)?;
        info!(
            submissions = batch.submissions.len(),
            dropped = batch.dropped_rows.len(),
            "normalized export"
        );

        let validator = Validator::new(
            self.client.clone(),
            self.tracker.clone(),
            self.config.asset.as_ref(),
            self.config.retry,
        );

        let mut validations = Vec::with_capacity(batch.submissions.len());
        for submission in &batch.submissions {
            let result = validator.validate(submission).await?;
            info!(
                row = submission.row,
                address = %submission.address,
                status = ?result.status,
                reason = %result.reason,
                "validated submission"
            );
            validations.push(result);
        }

        Ok((validations, batch))
    }

    /// Run the whole pipeline over a raw export.
    pub async fn run(
        &self,
        raw_export: &[u8],
        stop: &watch::Receiver<bool>,
    ) -> Result<PipelineRun> {
        let (validations, batch) = self.validate_export(raw_export).await?;

        let approved: Vec<_> = validations
            .iter()
            .filter(|v| v.status == ValidationStatus::Approved)
            .map(|v| v.submission.clone())
            .collect();

        self.log_distribution_plan(approved.len());

        let distributor = Distributor::new(
            self.client.clone(),
            self.tracker.clone(),
            self.config.asset.as_ref(),
            self.config.source_account.clone(),
            self.config.batch,
            self.config.payout,
            self.config.retry,
        );
        let distribution = distributor.run(&approved, stop).await?;

        let gross: u64 = distribution
            .outcomes
            .iter()
            .filter(|o| o.status == PaymentStatus::Sent)
            .map(|o| o.amount)
            .sum();
        let allocation = allocate(&self.config.fund, gross);
        info!(%allocation, "fund allocation computed");

        let report = summarize(
            &validations,
            &distribution,
            std::slice::from_ref(&allocation),
            batch.dropped_rows.len(),
            unix_now(),
        );

        Ok(PipelineRun {
            validations,
            distribution,
            allocation,
            report,
        })
    }

    /// Log the pacing plan before any payment goes out, so an operator can
    /// sanity-check the run's footprint.
    fn log_distribution_plan(&self, recipients: usize) {
        let batch = &self.config.batch;
        let batch_size = batch.batch_size.max(1);
        let batches = recipients.div_ceil(batch_size);
        let estimated_secs = (batches.saturating_sub(1) as u64) * batch.batch_delay_secs
            + (recipients.saturating_sub(1) as u64) * batch.tx_delay_secs;
        info!(
            recipients,
            batches,
            batch_size,
            estimated_secs,
            "distribution plan"
        );
    }
}
