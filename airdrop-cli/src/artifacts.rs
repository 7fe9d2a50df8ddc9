//! Output artifacts
//!
//! Three files leave a run: the recipients-ready list (approved, unpaid),
//! the per-submission outcome log (appended across runs), and the
//! structured report for the transparency site. All writers create parent
//! directories as needed.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use lib_airdrop::{
    PaymentOutcome, PaymentStatus, RunReport, ValidationResult, ValidationStatus,
};
use lib_stellar::format_stroops;

use crate::error::CliResult;

/// One line of the outcome log.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutcomeLine {
    pub identity: String,
    pub row: usize,
    pub address: String,
    pub validation_status: ValidationStatus,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_reference: Option<String>,
}

fn ensure_parent(path: &Path) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Write the approved-and-unpaid list, one address per line. Returns the
/// number of recipients written.
pub fn write_recipients(
    path: &Path,
    validations: &[ValidationResult],
    outcomes: &[PaymentOutcome],
) -> CliResult<usize> {
    let paid: Vec<&str> = outcomes
        .iter()
        .filter(|o| matches!(o.status, PaymentStatus::Sent | PaymentStatus::SkippedDuplicate))
        .map(|o| o.recipient.as_str())
        .collect();

    let mut lines = Vec::new();
    for validation in validations {
        if validation.status == ValidationStatus::Approved
            && !paid.contains(&validation.submission.address.as_str())
        {
            lines.push(validation.submission.address.clone());
        }
    }

    ensure_parent(path)?;
    fs::write(path, lines.join("\n") + if lines.is_empty() { "" } else { "\n" })?;
    Ok(lines.len())
}

/// Append one JSON line per submission to the outcome log.
pub fn append_outcome_log(
    path: &Path,
    validations: &[ValidationResult],
    outcomes: &[PaymentOutcome],
) -> CliResult<()> {
    // Pair payment outcomes with validations by recipient, consuming them
    // in order so duplicate identities keep their own entries.
    let mut by_recipient: HashMap<&str, Vec<&PaymentOutcome>> = HashMap::new();
    for outcome in outcomes.iter().rev() {
        by_recipient
            .entry(outcome.recipient.as_str())
            .or_default()
            .push(outcome);
    }

    ensure_parent(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    for validation in validations {
        let payment = by_recipient
            .get_mut(validation.submission.address.as_str())
            .and_then(Vec::pop);

        let line = OutcomeLine {
            identity: validation.submission.identity().to_string(),
            row: validation.submission.row,
            address: validation.submission.address.clone(),
            validation_status: validation.status,
            reason: validation.reason.clone(),
            payment_status: payment.map(|p| p.status),
            network_reference: payment.and_then(|p| p.network_reference.clone()),
        };
        writeln!(file, "{}", serde_json::to_string(&line)?)?;
    }
    Ok(())
}

/// Write the structured run report.
pub fn write_report(path: &Path, report: &RunReport) -> CliResult<()> {
    ensure_parent(path)?;
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

/// Load a previously written run report.
pub fn read_report(path: &Path) -> CliResult<RunReport> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Render the end-of-run console summary.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("PROCESSING SUMMARY\n");
    out.push_str("==================\n");
    out.push_str(&format!("  Submissions processed: {}\n", report.total_submissions));
    if report.dropped_rows > 0 {
        out.push_str(&format!("  Rows dropped (no address): {}\n", report.dropped_rows));
    }
    out.push_str(&format!("  Approved: {}\n", report.approved));
    out.push_str(&format!("  Pending (need trustlines): {}\n", report.pending));
    out.push_str(&format!("  Rejected: {}\n", report.rejected));
    out.push_str(&format!(
        "  Paid: {} ({} OGC)\n",
        report.paid,
        format_stroops(report.total_paid_stroops)
    ));
    out.push_str(&format!("  Failed: {}\n", report.failed));
    out.push_str(&format!("  Skipped duplicates: {}\n", report.skipped_duplicates));
    out.push_str(&format!(
        "  Fund contribution: {} OGC\n",
        format_stroops(report.fund_contribution_stroops)
    ));
    for (name, amount) in &report.fund_totals {
        out.push_str(&format!("    {}: {} OGC\n", name, format_stroops(*amount)));
    }
    if let Some(halted) = &report.halted {
        out.push_str(&format!("  Halted: {halted}\n"));
        out.push_str(&format!("  Unprocessed: {}\n", report.unprocessed));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_submissions::Submission;

    fn validation(address: &str, status: ValidationStatus, row: usize) -> ValidationResult {
        ValidationResult {
            submission: Submission {
                address: address.to_string(),
                contact: None,
                project_name: None,
                project_url: None,
                submitted_at: None,
                row,
            },
            status,
            reason: "test".to_string(),
            checked_at: 0,
        }
    }

    fn sent(address: &str) -> PaymentOutcome {
        PaymentOutcome {
            recipient: address.to_string(),
            amount: 10,
            status: PaymentStatus::Sent,
            network_reference: Some("tx-1".to_string()),
            error: None,
            attempted_at: 0,
        }
    }

    #[test]
    fn test_recipients_list_is_approved_minus_paid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipients.txt");

        let validations = vec![
            validation("GPAID", ValidationStatus::Approved, 1),
            validation("GUNPAID", ValidationStatus::Approved, 2),
            validation("GPENDING", ValidationStatus::PendingPrerequisite, 3),
        ];
        let outcomes = vec![sent("GPAID")];

        let written = write_recipients(&path, &validations, &outcomes).unwrap();
        assert_eq!(written, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "GUNPAID\n");
    }

    #[test]
    fn test_outcome_log_appends_one_line_per_submission() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcomes.jsonl");

        let validations = vec![
            validation("GAAA", ValidationStatus::Approved, 1),
            validation("GBBB", ValidationStatus::Rejected, 2),
        ];
        append_outcome_log(&path, &validations, &[sent("GAAA")]).unwrap();
        append_outcome_log(&path, &validations, &[sent("GAAA")]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 4);

        let first: OutcomeLine = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.address, "GAAA");
        assert_eq!(first.payment_status, Some(PaymentStatus::Sent));
        assert_eq!(first.network_reference.as_deref(), Some("tx-1"));

        let second: OutcomeLine = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.address, "GBBB");
        assert_eq!(second.payment_status, None);
    }

    #[test]
    fn test_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.json");

        let report = RunReport {
            total_submissions: 2,
            dropped_rows: 0,
            approved: 1,
            pending: 0,
            rejected: 1,
            paid: 1,
            failed: 0,
            skipped_duplicates: 0,
            total_paid_stroops: 20_000_000,
            fund_totals: vec![("primary-grants".to_string(), 10_000)],
            fund_contribution_stroops: 20_000,
            halted: None,
            unprocessed: 0,
            generated_at: 7,
        };

        write_report(&path, &report).unwrap();
        assert_eq!(read_report(&path).unwrap(), report);
    }

    #[test]
    fn test_summary_mentions_every_count() {
        let report = RunReport {
            total_submissions: 5,
            dropped_rows: 1,
            approved: 2,
            pending: 1,
            rejected: 2,
            paid: 2,
            failed: 0,
            skipped_duplicates: 0,
            total_paid_stroops: 40_000_000,
            fund_totals: vec![("education".to_string(), 12_000)],
            fund_contribution_stroops: 40_000,
            halted: Some("source funds exhausted at recipient GX".to_string()),
            unprocessed: 3,
            generated_at: 0,
        };

        let summary = render_summary(&report);
        assert!(summary.contains("Approved: 2"));
        assert!(summary.contains("Pending (need trustlines): 1"));
        assert!(summary.contains("Rejected: 2"));
        assert!(summary.contains("Paid: 2 (4.0000000 OGC)"));
        assert!(summary.contains("education: 0.0012000 OGC"));
        assert!(summary.contains("Halted: source funds exhausted"));
        assert!(summary.contains("Unprocessed: 3"));
    }
}
