//! Submission records and the export normalizer
//!
//! The airdrop form produces a spreadsheet export whose exact shape drifts:
//! column order changes, headers get reworded, extra columns appear. This
//! crate turns that export into canonical `Submission` records and derives
//! the stable identity every downstream stage keys on.

pub mod normalize;
pub mod types;

pub use normalize::{normalize_export, NormalizeError, NormalizedBatch};
pub use types::{Submission, SubmissionId};
