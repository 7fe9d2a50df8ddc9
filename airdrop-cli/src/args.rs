//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// OGC airdrop distribution tools
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "airdrop-cli")]
pub struct AirdropCli {
    /// Configuration file path
    #[arg(short, long, default_value = "airdrop.toml", env = "AIRDROP_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: AirdropCommand,
}

/// Airdrop commands
#[derive(Subcommand, Debug, Clone)]
pub enum AirdropCommand {
    /// Validate an export and distribute payouts to approved recipients
    Process(ProcessArgs),

    /// Validate an export and write the recipients list without paying
    Validate(ValidateArgs),

    /// Show the fund allocation policy applied to a gross amount
    Fund(FundArgs),

    /// Print the report from the previous run
    Report(ReportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Path to the submission export (CSV)
    pub export: PathBuf,

    /// Run the full pipeline without network payments or durable state
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the submission export (CSV)
    pub export: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FundArgs {
    /// Gross token amount to allocate, e.g. "250" or "2.5"
    pub gross: String,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Report path override; defaults to the configured artifact path
    #[arg(long)]
    pub path: Option<PathBuf>,
}
