//! Contribution fund allocation
//!
//! Pure accounting: given the gross amount distributed in a run, compute
//! the contribution taken for the fund and split it across the configured
//! categories. No transfers happen here; the result is recorded by the
//! reporter for the transparency artifacts.
//!
//! # Integer math
//!
//! All amounts are integer stroops, so results are deterministic with no
//! floating-point drift. Shares are basis points summing to 10_000
//! (checked at startup). Each category first receives its floored share;
//! the leftover units from flooring are then handed out one at a time in
//! decreasing fractional-remainder order, ties broken by category order.
//! That makes `sum(categories) == contribution` an exact equality.

use std::fmt;

use serde::{Deserialize, Serialize};

use lib_stellar::{format_stroops, Amount};

use crate::config::FundPolicy;

const BPS_DENOMINATOR: u128 = 10_000;

/// One category's computed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAmount {
    pub name: String,
    pub share_bps: u32,
    pub amount: Amount,
}

/// Result of allocating the contribution for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundAllocation {
    /// Gross amount the contribution was computed from.
    pub gross: Amount,
    pub contribution_rate_bps: u32,
    /// Total fund contribution: `gross * rate / 10_000`, floored.
    pub contribution: Amount,
    /// Per-category amounts in policy order. Sums to `contribution`.
    pub categories: Vec<CategoryAmount>,
}

impl fmt::Display for FundAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FundAllocation {{gross: {}, rate: {}bps, contribution: {}",
            format_stroops(self.gross),
            self.contribution_rate_bps,
            format_stroops(self.contribution)
        )?;
        for category in &self.categories {
            write!(f, ", {}: {}", category.name, format_stroops(category.amount))?;
        }
        write!(f, "}}")
    }
}

/// Allocate the contribution fund for a gross distributed amount.
///
/// Assumes the policy already passed the startup checks; an all-zero split
/// for a zero gross is still well-formed.
pub fn allocate(policy: &FundPolicy, gross: Amount) -> FundAllocation {
    let contribution = (u128::from(gross) * u128::from(policy.contribution_rate_bps)
        / BPS_DENOMINATOR) as Amount;

    // Floored share and remainder per category, in policy order.
    let mut categories: Vec<CategoryAmount> = Vec::with_capacity(policy.categories.len());
    let mut remainders: Vec<(usize, u128)> = Vec::with_capacity(policy.categories.len());
    let mut allocated: Amount = 0;

    for (index, category) in policy.categories.iter().enumerate() {
        let product = u128::from(contribution) * u128::from(category.share_bps);
        let share = (product / BPS_DENOMINATOR) as Amount;
        remainders.push((index, product % BPS_DENOMINATOR));
        allocated += share;
        categories.push(CategoryAmount {
            name: category.name.clone(),
            share_bps: category.share_bps,
            amount: share,
        });
    }

    // Hand the flooring leftover out by largest remainder, ties by order.
    let mut leftover = contribution - allocated;
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (index, _) in remainders {
        if leftover == 0 {
            break;
        }
        categories[index].amount += 1;
        leftover -= 1;
    }

    FundAllocation {
        gross,
        contribution_rate_bps: policy.contribution_rate_bps,
        contribution,
        categories,
    }
}
