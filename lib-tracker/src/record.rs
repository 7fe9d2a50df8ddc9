//! Processed-record type and its replacement rule

use serde::{Deserialize, Serialize};

use lib_submissions::SubmissionId;

/// Final outcome recorded for a submission identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Validated and eligible, payment not yet attempted.
    Approved,
    /// Account exists but the asset trustline is missing. Eligible for
    /// promotion on a later run.
    PendingPrerequisite,
    /// Validation failed terminally.
    Rejected,
    /// Payment succeeded. Terminal and supreme.
    Paid,
    /// Payment attempted and failed after retries.
    PaymentFailed,
}

impl OutcomeStatus {
    /// Terminal states survive reruns unchanged.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutcomeStatus::Rejected | OutcomeStatus::Paid)
    }
}

/// One persisted entry per submission identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub identity: SubmissionId,
    pub outcome: OutcomeStatus,
    pub reason: String,
    pub network_reference: Option<String>,
    /// Unix seconds of the most recent validation or payment attempt.
    pub last_attempt_at: u64,
}

/// Replacement rule for upserts: an existing `Paid` record is retained no
/// matter what arrives later. Everything else takes the latest write.
pub fn should_replace(existing: &ProcessedRecord, _incoming: &ProcessedRecord) -> bool {
    existing.outcome != OutcomeStatus::Paid
}
