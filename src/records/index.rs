//! Secondary indices stored as ledger records.
//!
//! An index is a JSON array of strings under a well-known key. Appending is a
//! read-modify-write: read (absent means empty), decode, push at the tail,
//! encode, write back. Entries are never sorted or deduplicated.
//!
//! Nothing ties an index write to the entity write before it. If the index
//! step fails the entity stays persisted but unindexed; [`Index::contains`]
//! lets a caller detect that afterwards.

use super::RecordStore;
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerStore;
use crate::types::{CONTRACT_INDEX_KEY, SHIPMENT_INDEX_KEY};
use tracing::{debug, warn};

/// Handle to one index record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Index {
    key: &'static str,
}

impl Index {
    /// Product types of defined contracts, in definition order.
    pub const CONTRACTS: Index = Index {
        key: CONTRACT_INDEX_KEY,
    };

    /// Keys of persisted shipment activity, in recording order.
    pub const SHIPMENTS: Index = Index {
        key: SHIPMENT_INDEX_KEY,
    };

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Current entries, oldest first. A JSON `null` reads as empty.
    pub fn read<L: LedgerStore>(&self, store: &RecordStore<L>) -> Result<Vec<String>> {
        store
            .get::<Option<Vec<String>>>(self.key)
            .map(|entries| entries.flatten().unwrap_or_default())
            .map_err(|e| self.unavailable(e))
    }

    /// Replace the index with an empty one.
    pub fn reset<L: LedgerStore>(&self, store: &RecordStore<L>) -> Result<()> {
        store
            .put(self.key, &Vec::<String>::new())
            .map_err(|e| self.unavailable(e))
    }

    /// Append `entry` at the tail. Returns the new length.
    pub fn append<L: LedgerStore>(&self, store: &RecordStore<L>, entry: &str) -> Result<usize> {
        let mut entries = self.read(store)?;
        entries.push(entry.to_string());

        store.put(self.key, &entries).map_err(|e| self.unavailable(e))?;

        debug!(index = self.key, entry, len = entries.len(), "appended index entry");
        Ok(entries.len())
    }

    pub fn contains<L: LedgerStore>(&self, store: &RecordStore<L>, entry: &str) -> Result<bool> {
        Ok(self.read(store)?.iter().any(|e| e == entry))
    }

    fn unavailable(&self, err: LedgerError) -> LedgerError {
        warn!(index = self.key, error = %err, "index unavailable");
        LedgerError::IndexUnavailable {
            index: self.key.to_string(),
            reason: err.to_string(),
        }
    }
}
