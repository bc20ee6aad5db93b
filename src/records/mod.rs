//! Typed access to ledger records and the indices kept over them.

mod index;
mod store;

pub use index::Index;
pub use store::RecordStore;
