//! Record store adapter: the only place ledger bytes are encoded or decoded.

use crate::error::{LedgerError, Result};
use crate::ledger::LedgerStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Typed JSON view over a [`LedgerStore`].
///
/// Reads distinguish an absent record (`Ok(None)`) from a present one that
/// fails to decode (`Err(Deserialization)`). Backend failures surface as
/// [`LedgerError::StoreUnavailable`].
pub struct RecordStore<L> {
    ledger: L,
}

impl<L: LedgerStore> RecordStore<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ledger.get(key).map_err(|e| unavailable("get", key, e))
    }

    pub fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.ledger
            .put(key, value)
            .map_err(|e| unavailable("put", key, e))
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.ledger.delete(key).map_err(|e| unavailable("delete", key, e))
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get_raw(key)?.is_some())
    }

    /// Fetch and decode the record at `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                LedgerError::Deserialization(format!("record {}: {}", key, e))
            }),
        }
    }

    /// Encode and write `value` under `key`.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(key, bytes)
    }
}

/// Normalize a backend failure into `StoreUnavailable`.
fn unavailable(op: &str, key: &str, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::StoreUnavailable(_) => err,
        other => {
            warn!(op, key, error = %other, "ledger call failed");
            LedgerError::StoreUnavailable(format!("{} {}: {}", op, key, other))
        }
    }
}
