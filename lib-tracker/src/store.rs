//! Tracker store implementations
//!
//! `SledTracker` is the production backend. `MemoryTracker` backs tests and
//! dry runs with the same replacement semantics.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

use lib_submissions::SubmissionId;

use crate::record::{should_replace, ProcessedRecord};

/// Tracker store error type
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Store error: {0}")]
    Database(String),

    #[error("Record encoding error: {0}")]
    Codec(String),
}

impl From<sled::Error> for TrackerError {
    fn from(err: sled::Error) -> Self {
        TrackerError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Codec(err.to_string())
    }
}

/// Result type alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Single-writer store of processed submissions.
///
/// `record` is a monotonic upsert: an existing `Paid` entry is retained no
/// matter what is written afterwards. `remove` is administrative and must
/// never be called from pipeline code.
pub trait StateTracker: Send + Sync {
    fn lookup(&self, id: &SubmissionId) -> TrackerResult<Option<ProcessedRecord>>;
    fn record(&self, record: ProcessedRecord) -> TrackerResult<()>;
    fn remove(&self, id: &SubmissionId) -> TrackerResult<()>;
}

const TREE_PROCESSED: &str = "processed_submissions";

/// Sled-backed tracker.
pub struct SledTracker {
    _db: sled::Db,
    processed: sled::Tree,
}

impl SledTracker {
    /// Open or create the store at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let db = sled::open(path)?;
        let processed = db.open_tree(TREE_PROCESSED)?;
        Ok(Self {
            _db: db,
            processed,
        })
    }

    /// Open a temporary store (for testing).
    pub fn open_temporary() -> TrackerResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let processed = db.open_tree(TREE_PROCESSED)?;
        Ok(Self {
            _db: db,
            processed,
        })
    }
}

impl StateTracker for SledTracker {
    fn lookup(&self, id: &SubmissionId) -> TrackerResult<Option<ProcessedRecord>> {
        match self.processed.get(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn record(&self, record: ProcessedRecord) -> TrackerResult<()> {
        let key = record.identity.clone();
        let encoded = serde_json::to_vec(&record)?;

        // Compare-and-swap loop so a concurrent writer can never replace a
        // paid entry between our read and our write.
        loop {
            let current = self.processed.get(&key)?;

            if let Some(bytes) = &current {
                let existing: ProcessedRecord = serde_json::from_slice(bytes)?;
                if !should_replace(&existing, &record) {
                    debug!(identity = %key, "paid record retained, upsert ignored");
                    return Ok(());
                }
            }

            let swap = self.processed.compare_and_swap(
                &key,
                current.as_ref().map(|v| v.as_ref()),
                Some(encoded.clone()),
            )?;
            if swap.is_ok() {
                break;
            }
        }

        if record.outcome.is_terminal() {
            self.processed
                .flush()
                .map_err(|e| TrackerError::Database(e.to_string()))?;
        }
        Ok(())
    }

    fn remove(&self, id: &SubmissionId) -> TrackerResult<()> {
        self.processed.remove(id)?;
        self.processed
            .flush()
            .map_err(|e| TrackerError::Database(e.to_string()))?;
        Ok(())
    }
}

/// In-memory tracker with the same semantics, for tests and dry runs.
#[derive(Default)]
pub struct MemoryTracker {
    records: Mutex<HashMap<SubmissionId, ProcessedRecord>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateTracker for MemoryTracker {
    fn lookup(&self, id: &SubmissionId) -> TrackerResult<Option<ProcessedRecord>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    fn record(&self, record: ProcessedRecord) -> TrackerResult<()> {
        let mut records = self.records.lock().unwrap();
        match records.get(&record.identity) {
            Some(existing) if !should_replace(existing, &record) => Ok(()),
            _ => {
                records.insert(record.identity.clone(), record);
                Ok(())
            }
        }
    }

    fn remove(&self, id: &SubmissionId) -> TrackerResult<()> {
        self.records.lock().unwrap().remove(id);
        Ok(())
    }
}
