//! In-memory ledger backend.

use super::LedgerStore;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Ledger held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All keys, in lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        self.records.read().keys().cloned().collect()
    }
}

impl LedgerStore for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.records.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.records.write().remove(key);
        Ok(())
    }
}
