//! Canonical submission record and identity

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One normalized row from the submission export.
///
/// Only the address is mandatory. Everything else is metadata carried along
/// for review artifacts and never consulted by validation or payment logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub address: String,
    pub contact: Option<String>,
    pub project_name: Option<String>,
    pub project_url: Option<String>,
    /// Raw export timestamp, kept opaque. Identity input only.
    pub submitted_at: Option<String>,
    /// 1-based data row index in the source export.
    pub row: usize,
}

impl Submission {
    /// Stable identity used for deduplication and idempotent state tracking.
    pub fn identity(&self) -> SubmissionId {
        SubmissionId::derive(&self.address, self.submitted_at.as_deref())
    }
}

/// Hex-encoded SHA-256 over `address ":" submitted_at`.
///
/// Derived exactly once, here. Every store key and dedup check uses this
/// value so repeated runs over overlapping exports agree on what they have
/// already seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn derive(address: &str, submitted_at: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(address.trim().as_bytes());
        hasher.update(b":");
        hasher.update(submitted_at.unwrap_or("").trim().as_bytes());

        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        SubmissionId(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<[u8]> for SubmissionId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}
