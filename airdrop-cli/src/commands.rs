//! Command handlers

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use lib_airdrop::{allocate, Pipeline};
use lib_stellar::{
    format_stroops, parse_stroops, FallbackClient, HorizonClient, HorizonHttpClient, NullClient,
    TransactionSigner,
};
use lib_tracker::{MemoryTracker, SledTracker, StateTracker};

use crate::args::{FundArgs, ProcessArgs, ReportArgs, ValidateArgs};
use crate::artifacts;
use crate::cli_config::FileConfig;
use crate::error::{CliError, CliResult};
use crate::signer::{CommandSigner, NoSigner};

/// Build the live Horizon client from the configuration: the primary
/// endpoint plus any configured fallbacks, tried in order on transient
/// failure.
fn live_client(
    config: &FileConfig,
    signer: Arc<dyn TransactionSigner>,
) -> CliResult<Arc<dyn HorizonClient>> {
    let timeout = Duration::from_secs(config.airdrop.request_timeout_secs);
    let build = |url: &str| -> CliResult<Arc<dyn HorizonClient>> {
        let client = HorizonHttpClient::new(url, timeout, signer.clone())
            .map_err(|e| CliError::ConfigError(e.to_string()))?;
        Ok(Arc::new(client))
    };

    let primary = build(config.airdrop.horizon_url())?;
    if config.airdrop.horizon_fallback_urls.is_empty() {
        return Ok(primary);
    }

    let mut clients = vec![primary];
    for url in &config.airdrop.horizon_fallback_urls {
        clients.push(build(url)?);
    }
    Ok(Arc::new(FallbackClient::new(clients)))
}

/// Stop signal wired to ctrl-c. The distributor completes the in-flight
/// payment before honoring it.
fn stop_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("stop requested, finishing the in-flight payment");
            let _ = tx.send(true);
        }
    });
    rx
}

/// Full pipeline run: validate, distribute, allocate, report.
pub async fn handle_process_command(config: &FileConfig, args: &ProcessArgs) -> CliResult<()> {
    let raw = fs::read(&args.export)?;

    let run = if args.dry_run {
        info!("dry run: no payments will be submitted, no state recorded");
        let tracker: Arc<dyn StateTracker> = Arc::new(MemoryTracker::new());
        let pipeline = Pipeline::new(Arc::new(NullClient), tracker, config.airdrop.clone())?;
        pipeline.run(&raw, &stop_on_ctrl_c()).await?
    } else {
        let signer: Arc<dyn TransactionSigner> = match &config.signer_command {
            Some(command) => Arc::new(CommandSigner::new(command.clone())),
            None => {
                return Err(CliError::ConfigError(
                    "signer_command is required for live distribution".to_string(),
                ))
            }
        };
        let tracker: Arc<dyn StateTracker> = Arc::new(
            SledTracker::open(&config.state_dir).map_err(lib_airdrop::AirdropError::Tracker)?,
        );
        let pipeline = Pipeline::new(
            live_client(config, signer)?,
            tracker,
            config.airdrop.clone(),
        )?;
        pipeline.run(&raw, &stop_on_ctrl_c()).await?
    };

    if args.dry_run {
        println!("DRY RUN (no payments submitted)\n");
    } else {
        let written = artifacts::write_recipients(
            &config.artifacts.recipients,
            &run.validations,
            &run.distribution.outcomes,
        )?;
        artifacts::append_outcome_log(
            &config.artifacts.outcomes,
            &run.validations,
            &run.distribution.outcomes,
        )?;
        artifacts::write_report(&config.artifacts.report, &run.report)?;
        info!(
            recipients_pending = written,
            report = %config.artifacts.report.display(),
            "artifacts written"
        );
    }

    print!("{}", artifacts::render_summary(&run.report));
    Ok(())
}

/// Validation-only run: writes the recipients list, pays nobody.
pub async fn handle_validate_command(config: &FileConfig, args: &ValidateArgs) -> CliResult<()> {
    let raw = fs::read(&args.export)?;

    let tracker: Arc<dyn StateTracker> = Arc::new(
        SledTracker::open(&config.state_dir).map_err(lib_airdrop::AirdropError::Tracker)?,
    );
    let pipeline = Pipeline::new(
        live_client(config, Arc::new(NoSigner))?,
        tracker,
        config.airdrop.clone(),
    )?;

    let (validations, batch) = pipeline.validate_export(&raw).await?;

    let written = artifacts::write_recipients(&config.artifacts.recipients, &validations, &[])?;
    artifacts::append_outcome_log(&config.artifacts.outcomes, &validations, &[])?;

    let approved = validations
        .iter()
        .filter(|v| v.status == lib_airdrop::ValidationStatus::Approved)
        .count();
    let pending = validations
        .iter()
        .filter(|v| v.status == lib_airdrop::ValidationStatus::PendingPrerequisite)
        .count();

    println!("Validated {} submissions ({} rows dropped)", validations.len(), batch.dropped_rows.len());
    println!("  Approved: {approved}");
    println!("  Pending: {pending}");
    println!("  Rejected: {}", validations.len() - approved - pending);
    println!(
        "Recipients list written to {} ({} addresses)",
        config.artifacts.recipients.display(),
        written
    );
    Ok(())
}

/// Show the fund split for a gross amount.
pub fn handle_fund_command(config: &FileConfig, args: &FundArgs) -> CliResult<()> {
    config.airdrop.validate()?;

    let gross = parse_stroops(&args.gross)
        .ok_or_else(|| CliError::InvalidAmount(args.gross.clone()))?;
    let allocation = allocate(&config.airdrop.fund, gross);

    println!("FUND ALLOCATION");
    println!("===============");
    println!("  Gross: {} OGC", format_stroops(allocation.gross));
    println!(
        "  Contribution ({} bps): {} OGC",
        allocation.contribution_rate_bps,
        format_stroops(allocation.contribution)
    );
    for category in &allocation.categories {
        println!(
            "    {} ({} bps): {} OGC",
            category.name,
            category.share_bps,
            format_stroops(category.amount)
        );
    }
    Ok(())
}

/// Print the report from the previous run.
pub fn handle_report_command(config: &FileConfig, args: &ReportArgs) -> CliResult<()> {
    let path = args.path.as_ref().unwrap_or(&config.artifacts.report);
    let report = artifacts::read_report(path)?;
    print!("{}", artifacts::render_summary(&report));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
