//! # Trade Ledger
//!
//! A transactional state engine for trade finance: contract terms, letters
//! of credit and shipment activity kept in a key-value ledger, with secondary
//! indices and an event notification for every dispatched operation.
//!
//! ## Core Concepts
//!
//! - **Ledger**: byte records under string keys ([`LedgerStore`])
//! - **Records**: typed JSON entities over the ledger ([`RecordStore`])
//! - **Indices**: append-only lists stored as records themselves ([`Index`])
//! - **Dispatch**: named operations that always advance the event counter
//!
//! ## Example
//!
//! ```ignore
//! use trade_ledger::{Engine, MemoryLedger};
//!
//! let engine = Engine::new(MemoryLedger::new());
//! engine.initialize(&["100".to_string()])?;
//!
//! let events = engine.subscribe();
//! engine.dispatch("init_contract_terms", &["C100".into(), "Produce".into(), "40".into()])?;
//!
//! assert_eq!(engine.contract_index()?, vec!["produce"]);
//! assert_eq!(events.recv()?.payload_text().as_deref(), Some("Event Counter is 1"));
//! ```

pub mod engine;
pub mod error;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod records;
pub mod types;
pub mod validation;

// Re-exports
pub use engine::{Engine, EngineConfig, Operation};
pub use error::{ErrorKind, LedgerError, Result, ShapeViolation};
pub use events::{
    DropReason, EventBus, LedgerEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
pub use ledger::{FileLedger, JournalConfig, LedgerStore, MemoryLedger};
pub use records::{Index, RecordStore};
pub use types::*;
