//! End-to-end pipeline tests
//!
//! These drive the full normalize, validate, distribute, allocate, report
//! flow over a scripted network client and an in-memory tracker, covering
//! the run-level guarantees: idempotence across runs, conservation of
//! validation counts, ordering, duplicate handling, and the funding halt.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use lib_airdrop::{
    AirdropConfig, AssetConfig, BatchConfig, FundPolicy, NetworkEnv, PaymentStatus, PayoutPolicy,
    Pipeline, PipelineRun, ValidationStatus,
};
use lib_stellar::{AssetRef, HorizonClient, PaymentRequest, RetryPolicy, StellarError};
use lib_tracker::{MemoryTracker, StateTracker};

/// Syntactically valid address built from one alphabet character.
fn test_address(tag: char) -> String {
    format!("G{}", tag.to_string().repeat(55))
}

#[derive(Clone, Copy)]
struct AccountState {
    exists: bool,
    trustline: bool,
}

/// Scripted Horizon: per-address account state, per-address payment
/// behavior, and a log of submitted destinations.
#[derive(Default)]
struct ScriptedHorizon {
    accounts: HashMap<String, AccountState>,
    underfunded_at: HashSet<String>,
    submitted: Mutex<Vec<String>>,
}

impl ScriptedHorizon {
    fn with_account(mut self, address: &str, trustline: bool) -> Self {
        self.accounts.insert(
            address.to_string(),
            AccountState {
                exists: true,
                trustline,
            },
        );
        self
    }

    fn underfunded_at(mut self, address: &str) -> Self {
        self.underfunded_at.insert(address.to_string());
        self
    }

    fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl HorizonClient for ScriptedHorizon {
    async fn account_exists(&self, address: &str) -> lib_stellar::Result<bool> {
        Ok(self.accounts.get(address).map(|a| a.exists).unwrap_or(false))
    }

    async fn has_trustline(
        &self,
        address: &str,
        _asset: &AssetRef,
    ) -> lib_stellar::Result<bool> {
        Ok(self
            .accounts
            .get(address)
            .map(|a| a.trustline)
            .unwrap_or(false))
    }

    async fn submit_payment(&self, request: &PaymentRequest) -> lib_stellar::Result<String> {
        self.submitted
            .lock()
            .unwrap()
            .push(request.destination.clone());
        if self.underfunded_at.contains(&request.destination) {
            return Err(StellarError::Underfunded("source exhausted".into()));
        }
        Ok(format!("tx-{}", self.submitted.lock().unwrap().len()))
    }
}

fn config() -> AirdropConfig {
    AirdropConfig {
        network: NetworkEnv::Testnet,
        horizon_url: None,
        horizon_fallback_urls: Vec::new(),
        asset: AssetConfig {
            code: "OGC".to_string(),
            issuer: test_address('I'),
        },
        source_account: test_address('S'),
        batch: BatchConfig {
            batch_size: 5,
            batch_delay_secs: 0,
            tx_delay_secs: 0,
        },
        payout: PayoutPolicy::Fixed {
            fixed_stroops: 20_000_000,
        },
        fund: FundPolicy::reference(),
        retry: RetryPolicy {
            attempts: 2,
            backoff_ms: 1,
        },
        request_timeout_secs: 5,
    }
}

fn export(rows: &[&str]) -> Vec<u8> {
    let mut text = String::from("address,project name,timestamp\n");
    for (index, address) in rows.iter().enumerate() {
        text.push_str(&format!("{address},Project {index},2025-10-29 10:0{index}:00\n"));
    }
    text.into_bytes()
}

async fn run_pipeline(
    client: Arc<ScriptedHorizon>,
    tracker: Arc<dyn StateTracker>,
    raw: &[u8],
) -> PipelineRun {
    let pipeline = Pipeline::new(client, tracker, config()).unwrap();
    let (_tx, stop) = watch::channel(false);
    pipeline.run(raw, &stop).await.unwrap()
}

#[tokio::test]
async fn test_mixed_export_scenario() {
    let eligible_a = test_address('A');
    let eligible_b = test_address('B');
    let no_trustline = test_address('C');
    let nonexistent = test_address('D');

    let client = Arc::new(
        ScriptedHorizon::default()
            .with_account(&eligible_a, true)
            .with_account(&eligible_b, true)
            .with_account(&no_trustline, false),
    );
    let raw = export(&[
        "not-an-address",
        &nonexistent,
        &no_trustline,
        &eligible_a,
        &eligible_b,
    ]);

    let run = run_pipeline(client.clone(), Arc::new(MemoryTracker::new()), &raw).await;

    assert_eq!(run.report.total_submissions, 5);
    assert_eq!(run.report.rejected, 2);
    assert_eq!(run.report.pending, 1);
    assert_eq!(run.report.approved, 2);
    assert_eq!(run.report.paid, 2);
    assert_eq!(run.report.failed, 0);

    // Only the two eligible addresses ever reached the network submitter
    assert_eq!(client.submitted(), vec![eligible_a, eligible_b]);

    // Reasons surface per class
    let reasons: Vec<_> = run.validations.iter().map(|v| v.reason.as_str()).collect();
    assert!(reasons.contains(&"malformed address"));
    assert!(reasons.contains(&"account not found"));
    assert!(reasons.contains(&"trustline not established"));
}

#[tokio::test]
async fn test_validation_counts_are_conserved() {
    let client = Arc::new(
        ScriptedHorizon::default()
            .with_account(&test_address('A'), true)
            .with_account(&test_address('C'), false),
    );
    let raw = export(&[
        &test_address('A'),
        &test_address('C'),
        &test_address('E'),
        "bogus",
    ]);

    let run = run_pipeline(client, Arc::new(MemoryTracker::new()), &raw).await;

    assert_eq!(
        run.report.approved + run.report.pending + run.report.rejected,
        run.report.total_submissions
    );
}

#[tokio::test]
async fn test_second_run_issues_no_new_payments() {
    let eligible_a = test_address('A');
    let eligible_b = test_address('B');
    let client = Arc::new(
        ScriptedHorizon::default()
            .with_account(&eligible_a, true)
            .with_account(&eligible_b, true),
    );
    let tracker: Arc<dyn StateTracker> = Arc::new(MemoryTracker::new());
    let raw = export(&[&eligible_a, &eligible_b]);

    let first = run_pipeline(client.clone(), tracker.clone(), &raw).await;
    assert_eq!(first.report.paid, 2);
    assert_eq!(client.submitted().len(), 2);

    let second = run_pipeline(client.clone(), tracker, &raw).await;
    assert_eq!(second.report.paid, 0);
    assert_eq!(second.report.skipped_duplicates, 2);

    // No additional network submissions happened on the rerun
    assert_eq!(client.submitted().len(), 2);
}

#[tokio::test]
async fn test_duplicate_rows_in_one_export() {
    let eligible = test_address('A');
    let client = Arc::new(ScriptedHorizon::default().with_account(&eligible, true));

    // Same address and timestamp twice: one identity
    let raw = format!(
        "address,timestamp\n{eligible},2025-10-29 10:00:00\n{eligible},2025-10-29 10:00:00\n"
    );

    let run = run_pipeline(client.clone(), Arc::new(MemoryTracker::new()), raw.as_bytes()).await;

    assert_eq!(run.report.paid, 1);
    assert_eq!(run.report.skipped_duplicates, 1);
    assert_eq!(client.submitted().len(), 1);
}

#[tokio::test]
async fn test_funding_exhaustion_halts_and_still_reports() {
    let addresses: Vec<String> = "ABCDEFGHIJ".chars().map(test_address).collect();
    let mut client = ScriptedHorizon::default();
    for address in &addresses {
        client = client.with_account(address, true);
    }
    // The third approved recipient drains the source
    let client = Arc::new(client.underfunded_at(&addresses[2]));

    let rows: Vec<&str> = addresses.iter().map(String::as_str).collect();
    let run = run_pipeline(client.clone(), Arc::new(MemoryTracker::new()), &export(&rows)).await;

    assert_eq!(run.report.approved, 10);
    assert_eq!(run.report.paid, 2);
    assert_eq!(run.report.failed, 1);
    assert_eq!(run.report.unprocessed, 7);
    assert!(run.report.halted.is_some());

    // Recipients beyond the halt were never attempted
    assert_eq!(client.submitted().len(), 3);

    // Outcomes stay in submission order up to the halt
    let attempted: Vec<_> = run
        .distribution
        .outcomes
        .iter()
        .map(|o| o.recipient.clone())
        .collect();
    assert_eq!(attempted, addresses[..3].to_vec());
}

#[tokio::test]
async fn test_fund_allocation_follows_distributed_gross() {
    let eligible_a = test_address('A');
    let eligible_b = test_address('B');
    let client = Arc::new(
        ScriptedHorizon::default()
            .with_account(&eligible_a, true)
            .with_account(&eligible_b, true),
    );
    let raw = export(&[&eligible_a, &eligible_b]);

    let run = run_pipeline(client, Arc::new(MemoryTracker::new()), &raw).await;

    // Two fixed payouts of 2 OGC: gross 4 OGC, contribution at 10 bps
    assert_eq!(run.allocation.gross, 40_000_000);
    assert_eq!(run.allocation.contribution, 40_000);
    let total: u64 = run.allocation.categories.iter().map(|c| c.amount).sum();
    assert_eq!(total, run.allocation.contribution);
    assert_eq!(run.report.fund_contribution_stroops, 40_000);
}

#[tokio::test]
async fn test_pending_promotion_across_runs() {
    let address = test_address('A');
    let tracker: Arc<dyn StateTracker> = Arc::new(MemoryTracker::new());
    let raw = export(&[&address]);

    // First run: account exists but no trustline yet
    let before = Arc::new(ScriptedHorizon::default().with_account(&address, false));
    let first = run_pipeline(before, tracker.clone(), &raw).await;
    assert_eq!(first.report.pending, 1);
    assert_eq!(first.report.paid, 0);

    // Second run: the trustline has been established in the meantime
    let after = Arc::new(ScriptedHorizon::default().with_account(&address, true));
    let second = run_pipeline(after.clone(), tracker, &raw).await;
    assert_eq!(second.report.pending, 0);
    assert_eq!(second.report.paid, 1);
    assert_eq!(after.submitted().len(), 1);
}

#[tokio::test]
async fn test_validate_export_pays_nobody() {
    let eligible = test_address('A');
    let client = Arc::new(ScriptedHorizon::default().with_account(&eligible, true));
    let pipeline = Pipeline::new(
        client.clone(),
        Arc::new(MemoryTracker::new()),
        config(),
    )
    .unwrap();

    let (validations, batch) = pipeline
        .validate_export(&export(&[&eligible, "junk"]))
        .await
        .unwrap();

    assert_eq!(batch.submissions.len(), 2);
    assert_eq!(validations.len(), 2);
    assert_eq!(validations[0].status, ValidationStatus::Approved);
    assert_eq!(validations[1].status, ValidationStatus::Rejected);
    assert!(client.submitted().is_empty());
}

#[tokio::test]
async fn test_outcomes_carry_network_references() {
    let eligible = test_address('A');
    let client = Arc::new(ScriptedHorizon::default().with_account(&eligible, true));
    let run = run_pipeline(client, Arc::new(MemoryTracker::new()), &export(&[&eligible])).await;

    let outcome = &run.distribution.outcomes[0];
    assert_eq!(outcome.status, PaymentStatus::Sent);
    assert!(outcome.network_reference.as_deref().unwrap().starts_with("tx-"));
}
