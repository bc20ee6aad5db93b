//! Ledger storage port.
//!
//! The engine only needs atomic get/put/delete on byte records keyed by
//! strings. Two backends are provided:
//! - [`MemoryLedger`]: in-process map, for tests and embedding
//! - [`FileLedger`]: checksummed append-only journal replayed on open
//!
//! Each call is atomic on its own. Nothing here spans calls; grouping several
//! calls into one logical operation is the engine's job.

mod journal;
mod memory;

use crate::error::Result;
use std::sync::Arc;

pub use journal::{FileLedger, JournalConfig};
pub use memory::MemoryLedger;

/// Byte-keyed record storage consumed by the engine.
pub trait LedgerStore: Send + Sync {
    /// Fetch the record at `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous record.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove the record at `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for &T {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
