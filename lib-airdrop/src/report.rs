//! Run reporting
//!
//! Pure aggregation of whatever a run produced, complete or halted early.
//! The result serializes to the published transparency artifact and renders
//! as the end-of-run console summary.

use serde::{Deserialize, Serialize};

use lib_stellar::Amount;

use crate::distribute::{DistributionOutcome, PaymentStatus};
use crate::fund::FundAllocation;
use crate::validate::{ValidationResult, ValidationStatus};

/// Aggregate counts and totals for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub total_submissions: usize,
    /// Input rows dropped by the normalizer for a missing address.
    pub dropped_rows: usize,

    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,

    pub paid: usize,
    pub failed: usize,
    pub skipped_duplicates: usize,

    /// Sum of all sent payment amounts, in stroops.
    pub total_paid_stroops: Amount,

    /// Fund totals per category, in policy order.
    pub fund_totals: Vec<(String, Amount)>,
    pub fund_contribution_stroops: Amount,

    /// Present when the run stopped before the approved list was exhausted.
    pub halted: Option<String>,
    pub unprocessed: usize,

    pub generated_at: u64,
}

/// Aggregate validation results, payment outcomes, and fund allocations.
pub fn summarize(
    validations: &[ValidationResult],
    distribution: &DistributionOutcome,
    allocations: &[FundAllocation],
    dropped_rows: usize,
    generated_at: u64,
) -> RunReport {
    let mut report = RunReport {
        total_submissions: validations.len(),
        dropped_rows,
        approved: 0,
        pending: 0,
        rejected: 0,
        paid: 0,
        failed: 0,
        skipped_duplicates: 0,
        total_paid_stroops: 0,
        fund_totals: Vec::new(),
        fund_contribution_stroops: 0,
        halted: distribution.halted.as_ref().map(|h| h.to_string()),
        unprocessed: distribution.unprocessed,
        generated_at,
    };

    for validation in validations {
        match validation.status {
            ValidationStatus::Approved => report.approved += 1,
            ValidationStatus::PendingPrerequisite => report.pending += 1,
            ValidationStatus::Rejected => report.rejected += 1,
        }
    }

    for outcome in &distribution.outcomes {
        match outcome.status {
            PaymentStatus::Sent => {
                report.paid += 1;
                report.total_paid_stroops += outcome.amount;
            }
            PaymentStatus::Failed => report.failed += 1,
            PaymentStatus::SkippedDuplicate => report.skipped_duplicates += 1,
        }
    }

    for allocation in allocations {
        report.fund_contribution_stroops += allocation.contribution;
        for category in &allocation.categories {
            match report
                .fund_totals
                .iter_mut()
                .find(|(name, _)| name == &category.name)
            {
                Some((_, total)) => *total += category.amount,
                None => report
                    .fund_totals
                    .push((category.name.clone(), category.amount)),
            }
        }
    }

    report
}
