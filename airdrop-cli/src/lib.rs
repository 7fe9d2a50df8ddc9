//! OGC airdrop CLI
//!
//! Command-line front end for the airdrop pipeline: loads configuration,
//! wires the network client, signer, and state tracker together, and writes
//! the run artifacts.

pub mod args;
pub mod artifacts;
pub mod cli_config;
pub mod commands;
pub mod error;
pub mod signer;

use clap::Parser;

use args::{AirdropCli, AirdropCommand};

/// Parse arguments and dispatch to the command handlers.
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = AirdropCli::parse();
    let config = cli_config::load_config(&cli.config)?;

    match &cli.command {
        AirdropCommand::Process(args) => commands::handle_process_command(&config, args).await?,
        AirdropCommand::Validate(args) => commands::handle_validate_command(&config, args).await?,
        AirdropCommand::Fund(args) => commands::handle_fund_command(&config, args)?,
        AirdropCommand::Report(args) => commands::handle_report_command(&config, args)?,
    }

    Ok(())
}
