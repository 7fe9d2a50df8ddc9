//! CLI configuration loader
//!
//! One TOML file carries the pipeline configuration plus the CLI-owned
//! paths (state directory, artifacts, signer command). Network selection
//! and the Horizon endpoint can be overridden through the environment so a
//! testnet config can be pointed at production without editing the file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lib_airdrop::{AirdropConfig, NetworkEnv};

use crate::error::{CliError, CliResult};

/// Environment overrides recognized on top of the config file.
pub const ENV_NETWORK: &str = "AIRDROP_NETWORK";
pub const ENV_HORIZON_URL: &str = "AIRDROP_HORIZON_URL";

/// Output artifact locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    #[serde(default = "default_recipients_path")]
    pub recipients: PathBuf,
    #[serde(default = "default_outcomes_path")]
    pub outcomes: PathBuf,
    #[serde(default = "default_report_path")]
    pub report: PathBuf,
}

fn default_recipients_path() -> PathBuf {
    PathBuf::from("recipients.txt")
}
fn default_outcomes_path() -> PathBuf {
    PathBuf::from("outcomes.jsonl")
}
fn default_report_path() -> PathBuf {
    PathBuf::from("report.json")
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            recipients: default_recipients_path(),
            outcomes: default_outcomes_path(),
            report: default_report_path(),
        }
    }
}

/// Full CLI configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(flatten)]
    pub airdrop: AirdropConfig,

    /// Directory for the durable processed-submission store.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default)]
    pub artifacts: ArtifactPaths,

    /// External command that signs payment envelopes. Receives the payment
    /// as JSON on stdin and prints the signed envelope on stdout.
    #[serde(default)]
    pub signer_command: Option<String>,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".airdrop-state")
}

/// Load the configuration file and apply environment overrides.
pub fn load_config(path: &Path) -> CliResult<FileConfig> {
    if !path.exists() {
        return Err(CliError::ConfigLoadFailed {
            path: path.display().to_string(),
            reason: "file not found".to_string(),
        });
    }

    let raw = fs::read_to_string(path).map_err(|e| CliError::ConfigLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut config: FileConfig =
        toml::from_str(&raw).map_err(|e| CliError::ConfigError(format!("invalid config: {e}")))?;

    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut FileConfig) -> CliResult<()> {
    if let Ok(network) = env::var(ENV_NETWORK) {
        config.airdrop.network = match network.to_lowercase().as_str() {
            "testnet" => NetworkEnv::Testnet,
            "public" => NetworkEnv::Public,
            other => {
                return Err(CliError::ConfigError(format!(
                    "unknown network in {ENV_NETWORK}: {other}"
                )))
            }
        };
    }
    if let Ok(url) = env::var(ENV_HORIZON_URL) {
        config.airdrop.horizon_url = Some(url);
    }
    Ok(())
}
