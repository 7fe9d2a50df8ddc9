//! OGC Airdrop Command-Line Interface
//!
//! Entry point for the airdrop-cli binary. Initializes logging, parses
//! command-line arguments, and delegates to the command handlers.

use std::env;

use airdrop_cli::run_cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run_cli().await
}
