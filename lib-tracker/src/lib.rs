//! Durable processed-submission tracking
//!
//! This crate is the system's idempotence guarantee. Every submission the
//! pipeline has ever evaluated leaves a `ProcessedRecord` here, keyed by the
//! submission identity, and a paid record can never be downgraded. The
//! validator consults it before re-validating and the distributor consults
//! it again immediately before paying, so repeated runs over overlapping
//! exports issue at most one successful payment per identity.
//!
//! # Store contract
//!
//! 1. **Upserts are atomic** - a torn write must never corrupt prior
//!    entries (sled provides this at the tree level).
//! 2. **`Paid` is supreme** - once recorded, no later write replaces it.
//!    Enforced inside the store, not by callers.
//! 3. **Records are never deleted by the pipeline** - `remove` exists for
//!    explicit administrative use only.
//! 4. **Terminal writes are flushed** - a crash after a payment loses at
//!    most the in-flight attempt, never a recorded outcome.

pub mod record;
pub mod store;

pub use record::{OutcomeStatus, ProcessedRecord};
pub use store::{MemoryTracker, SledTracker, StateTracker, TrackerError, TrackerResult};
