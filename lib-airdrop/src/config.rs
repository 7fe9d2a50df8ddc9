//! Pipeline configuration
//!
//! Every knob the pipeline honors lives here: network environment, asset,
//! batching, payout bounds, fund split, and retry discipline. All of it
//! arrives from the outside (TOML file, environment, CLI flags); the only
//! values baked in are the documented serde fallbacks below.
//!
//! `AirdropConfig::validate` runs before any network call and fails fast on
//! an inconsistent fund split or payout bounds.

use serde::{Deserialize, Serialize};

use lib_stellar::{Amount, AssetRef, RetryPolicy};
use lib_stellar::horizon::{HORIZON_PUBLIC, HORIZON_TESTNET};

use crate::error::AirdropError;

/// Target network environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkEnv {
    Testnet,
    Public,
}

impl NetworkEnv {
    pub fn default_horizon_url(&self) -> &'static str {
        match self {
            NetworkEnv::Testnet => HORIZON_TESTNET,
            NetworkEnv::Public => HORIZON_PUBLIC,
        }
    }
}

/// Asset being distributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub code: String,
    pub issuer: String,
}

impl AssetConfig {
    pub fn as_ref(&self) -> AssetRef {
        AssetRef::new(self.code.clone(), self.issuer.clone())
    }
}

/// Batch pacing. Payments run one at a time; these control the gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Payments per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between batches, in seconds.
    #[serde(default = "default_batch_delay")]
    pub batch_delay_secs: u64,
    /// Pause between payments inside a batch, in seconds.
    #[serde(default = "default_tx_delay")]
    pub tx_delay_secs: u64,
}

fn default_batch_size() -> usize {
    5
}
fn default_batch_delay() -> u64 {
    10
}
fn default_tx_delay() -> u64 {
    2
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_secs: default_batch_delay(),
            tx_delay_secs: default_tx_delay(),
        }
    }
}

/// Per-recipient payout amount policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayoutPolicy {
    /// Every recipient receives the same amount.
    Fixed { fixed_stroops: Amount },
    /// Uniform random amount within inclusive bounds.
    Bounded {
        min_stroops: Amount,
        max_stroops: Amount,
    },
}

impl PayoutPolicy {
    /// Draw the amount for the next payment.
    pub fn amount(&self) -> Amount {
        match *self {
            PayoutPolicy::Fixed { fixed_stroops } => fixed_stroops,
            PayoutPolicy::Bounded {
                min_stroops,
                max_stroops,
            } => {
                use rand::Rng;
                rand::thread_rng().gen_range(min_stroops..=max_stroops)
            }
        }
    }
}

/// One fund category and its share in basis points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundCategory {
    pub name: String,
    pub share_bps: u32,
}

/// Contribution fund policy: rate taken from the distributed gross, split
/// across named categories whose shares must sum to exactly 10_000 bps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundPolicy {
    pub contribution_rate_bps: u32,
    pub categories: Vec<FundCategory>,
}

impl FundPolicy {
    /// Reference policy: 50% primary grants, 30% education, 20% operations.
    pub fn reference() -> Self {
        Self {
            contribution_rate_bps: 10,
            categories: vec![
                FundCategory {
                    name: "primary-grants".to_string(),
                    share_bps: 5_000,
                },
                FundCategory {
                    name: "education".to_string(),
                    share_bps: 3_000,
                },
                FundCategory {
                    name: "operations".to_string(),
                    share_bps: 2_000,
                },
            ],
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirdropConfig {
    pub network: NetworkEnv,
    /// Horizon endpoint override; defaults to the network's public endpoint.
    #[serde(default)]
    pub horizon_url: Option<String>,
    /// Further endpoints tried, in order, when the primary fails
    /// transiently.
    #[serde(default)]
    pub horizon_fallback_urls: Vec<String>,
    pub asset: AssetConfig,
    /// Account funding the payouts.
    pub source_account: String,
    #[serde(default)]
    pub batch: BatchConfig,
    pub payout: PayoutPolicy,
    pub fund: FundPolicy,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl AirdropConfig {
    /// Resolved Horizon endpoint.
    pub fn horizon_url(&self) -> &str {
        self.horizon_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_horizon_url())
    }

    /// Startup-time consistency checks. Must pass before any network call.
    pub fn validate(&self) -> Result<(), AirdropError> {
        if self.fund.categories.is_empty() {
            return Err(AirdropError::InvalidConfiguration(
                "fund split needs at least one category".to_string(),
            ));
        }

        let share_sum: u64 = self
            .fund
            .categories
            .iter()
            .map(|c| u64::from(c.share_bps))
            .sum();
        if share_sum != 10_000 {
            return Err(AirdropError::InvalidConfiguration(format!(
                "fund category shares must sum to 10000 bps, got {share_sum}"
            )));
        }

        if self.fund.contribution_rate_bps > 10_000 {
            return Err(AirdropError::InvalidConfiguration(format!(
                "contribution rate {} bps exceeds 10000",
                self.fund.contribution_rate_bps
            )));
        }

        if let PayoutPolicy::Bounded {
            min_stroops,
            max_stroops,
        } = self.payout
        {
            if min_stroops > max_stroops {
                return Err(AirdropError::InvalidConfiguration(format!(
                    "payout bounds inverted: min {min_stroops} > max {max_stroops}"
                )));
            }
        }

        if self.batch.batch_size == 0 {
            return Err(AirdropError::InvalidConfiguration(
                "batch size must be at least 1".to_string(),
            ));
        }

        if self.retry.attempts == 0 {
            return Err(AirdropError::InvalidConfiguration(
                "retry attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn test_config() -> AirdropConfig {
        AirdropConfig {
            network: NetworkEnv::Testnet,
            horizon_url: None,
            horizon_fallback_urls: Vec::new(),
            asset: AssetConfig {
                code: "OGC".to_string(),
                issuer: "GISSUER".to_string(),
            },
            source_account: "GSOURCE".to_string(),
            batch: BatchConfig::default(),
            payout: PayoutPolicy::Fixed {
                fixed_stroops: 10_000_000,
            },
            fund: FundPolicy::reference(),
            retry: RetryPolicy::default(),
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn test_reference_policy_is_valid() {
        test_config().validate().unwrap();
    }

    #[test]
    fn test_fund_shares_must_sum_to_one() {
        let mut config = test_config();
        config.fund.categories[0].share_bps = 4_999;
        assert!(matches!(
            config.validate(),
            Err(AirdropError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_categories_rejected() {
        let mut config = test_config();
        config.fund.categories.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_payout_bounds_rejected() {
        let mut config = test_config();
        config.payout = PayoutPolicy::Bounded {
            min_stroops: 30_000_000,
            max_stroops: 10_000_000,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = test_config();
        config.batch.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_horizon_url_override() {
        let mut config = test_config();
        assert_eq!(
            config.horizon_url(),
            "https://horizon-testnet.stellar.org"
        );
        config.network = NetworkEnv::Public;
        assert_eq!(config.horizon_url(), "https://horizon.stellar.org");
        config.horizon_url = Some("http://localhost:8000".to_string());
        assert_eq!(config.horizon_url(), "http://localhost:8000");
    }

    #[test]
    fn test_bounded_payout_stays_in_range() {
        let policy = PayoutPolicy::Bounded {
            min_stroops: 10_000_000,
            max_stroops: 30_000_000,
        };
        for _ in 0..100 {
            let amount = policy.amount();
            assert!((10_000_000..=30_000_000).contains(&amount));
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let config = test_config();
        let encoded = serde_json::to_string(&config).unwrap();
        let decoded: AirdropConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(config, decoded);
    }
}
