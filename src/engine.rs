//! Engine tying the ledger, handlers and event bus together.

use crate::error::{LedgerError, Result};
use crate::events::{EventBus, SubscriptionConfig, SubscriptionHandle};
use crate::handlers;
use crate::ledger::LedgerStore;
use crate::records::{Index, RecordStore};
use crate::types::{
    ContractTerms, LetterOfCredit, EVENT_COUNTER_KEY, INITIAL_EVENT_COUNTER,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Topic every dispatch notification is emitted on.
    pub event_topic: String,

    /// Store letters of credit and shipment activity instead of only
    /// validating them.
    pub persist_trade_records: bool,

    /// Buffer size for subscriptions made through [`Engine::subscribe`].
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_topic: "evtsender".to_string(),
            persist_trade_records: false,
            event_buffer_size: 1000,
        }
    }
}

/// Operations routed by [`Engine::dispatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Reset bookkeeping, same as bootstrap.
    Init,
    DefineContractTerms,
    OpenLetterOfCredit,
    RecordShipmentActivity,
}

impl Operation {
    /// Exact, case-sensitive lookup of an operation name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "init" => Some(Operation::Init),
            "init_contract_terms" => Some(Operation::DefineContractTerms),
            "create_loc" => Some(Operation::OpenLetterOfCredit),
            "shipment_activity" => Some(Operation::RecordShipmentActivity),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::DefineContractTerms => "init_contract_terms",
            Operation::OpenLetterOfCredit => "create_loc",
            Operation::RecordShipmentActivity => "shipment_activity",
        }
    }
}

/// Read the event counter. An absent counter reads as its initial value.
fn read_counter<L: LedgerStore>(store: &RecordStore<L>) -> Result<u64> {
    match store.get_raw(EVENT_COUNTER_KEY)? {
        None => Ok(INITIAL_EVENT_COUNTER),
        Some(bytes) => std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| {
                LedgerError::Corruption(format!(
                    "event counter is not a number: {:?}",
                    String::from_utf8_lossy(&bytes)
                ))
            }),
    }
}

/// Persist `counter + 1`, then emit the notification carrying `counter`.
fn advance_counter<L: LedgerStore>(
    store: &RecordStore<L>,
    bus: &EventBus,
    topic: &str,
) -> Result<()> {
    let emitted = read_counter(store)?;
    let next = emitted.checked_add(1).ok_or_else(|| {
        LedgerError::Corruption(format!("event counter cannot advance past {}", emitted))
    })?;

    store.put_raw(EVENT_COUNTER_KEY, next.to_string().into_bytes())?;
    bus.emit(topic, format!("Event Counter is {}", emitted).as_bytes());

    debug!(counter = emitted, "event counter advanced");
    Ok(())
}

/// Advances the event counter exactly once per dispatch.
///
/// [`EventGuard::finish`] advances it and reports the outcome. If the guard
/// is dropped unfinished (the handler panicked) it advances on drop instead.
struct EventGuard<'a, L: LedgerStore> {
    store: &'a RecordStore<L>,
    bus: &'a EventBus,
    topic: &'a str,
    armed: bool,
}

impl<'a, L: LedgerStore> EventGuard<'a, L> {
    fn arm(store: &'a RecordStore<L>, bus: &'a EventBus, topic: &'a str) -> Self {
        Self {
            store,
            bus,
            topic,
            armed: true,
        }
    }

    fn finish(mut self) -> Result<()> {
        self.armed = false;
        advance_counter(self.store, self.bus, self.topic)
    }
}

impl<L: LedgerStore> Drop for EventGuard<'_, L> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = advance_counter(self.store, self.bus, self.topic) {
                error!(error = %e, "failed to advance event counter after aborted dispatch");
            }
        }
    }
}

/// The trade ledger engine.
///
/// Provides the invocation surface:
/// - [`initialize`](Engine::initialize): bootstrap
/// - [`dispatch`](Engine::dispatch): named mutating operations, each emitting
///   one notification whatever its outcome
/// - [`query`](Engine::query): read a record by key
///
/// Dispatches are serialized by a write lock held for the whole operation,
/// so index read-modify-writes never interleave.
pub struct Engine<L: LedgerStore> {
    config: EngineConfig,
    records: RecordStore<L>,
    events: EventBus,
    write_lock: Mutex<()>,
}

impl<L: LedgerStore> Engine<L> {
    pub fn new(ledger: L) -> Self {
        Self::with_config(ledger, EngineConfig::default())
    }

    pub fn with_config(ledger: L, config: EngineConfig) -> Self {
        Self {
            config,
            records: RecordStore::new(ledger),
            events: EventBus::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn records(&self) -> &RecordStore<L> {
        &self.records
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to this engine's notification topic.
    pub fn subscribe(&self) -> SubscriptionHandle {
        self.events.subscribe(
            SubscriptionConfig::topic(self.config.event_topic.clone())
                .with_buffer_size(self.config.event_buffer_size),
        )
    }

    // --- Invocation ---

    /// Bootstrap the ledger. Emits no notification.
    pub fn initialize(&self, args: &[String]) -> Result<Vec<u8>> {
        let _lock = self.write_lock.lock();
        handlers::initialize(&self.records, args)?;
        Ok(Vec::new())
    }

    /// Run a named operation.
    ///
    /// The event counter advances and a notification is emitted on every
    /// path: success, handler failure, and unknown operation names. A handler
    /// error takes precedence over a failure to advance the counter.
    pub fn dispatch(&self, operation: &str, args: &[String]) -> Result<Vec<u8>> {
        let _lock = self.write_lock.lock();

        debug!(operation, args = args.len(), "dispatching");

        let guard = EventGuard::arm(&self.records, &self.events, &self.config.event_topic);
        let outcome = Operation::from_name(operation).map(|op| self.run(op, args));
        let advanced = guard.finish();

        let outcome = outcome.unwrap_or_else(|| {
            warn!(operation, "invoke did not find function");
            Err(LedgerError::UnknownOperation(operation.to_string()))
        });

        match (outcome, advanced) {
            (Ok(result), Ok(())) => Ok(result),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => {
                debug!(operation, error = %e, "operation failed");
                Err(e)
            }
            (Err(e), Err(counter_err)) => {
                error!(
                    operation,
                    error = %e,
                    counter_error = %counter_err,
                    "operation failed and event counter could not advance"
                );
                Err(e)
            }
        }
    }

    /// Read a record. `function` must be `"query"`. Emits no notification.
    pub fn query(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        if function != "query" {
            return Err(LedgerError::UnknownOperation(function.to_string()));
        }
        handlers::query_record(&self.records, args)
    }

    /// Delete the record at the single key argument. Indices are not touched.
    pub fn delete_record(&self, args: &[String]) -> Result<()> {
        let _lock = self.write_lock.lock();
        handlers::delete_record(&self.records, args)
    }

    fn run(&self, op: Operation, args: &[String]) -> Result<Vec<u8>> {
        let persist = self.config.persist_trade_records;
        match op {
            Operation::Init => handlers::initialize(&self.records, args)?,
            Operation::DefineContractTerms => {
                handlers::define_contract_terms(&self.records, args)?;
            }
            Operation::OpenLetterOfCredit => {
                handlers::open_letter_of_credit(&self.records, args, persist)?;
            }
            Operation::RecordShipmentActivity => {
                handlers::record_shipment_activity(&self.records, args, persist)?;
            }
        }
        Ok(Vec::new())
    }

    // --- Typed Reads ---

    pub fn contract_terms(&self, contract_id: &str) -> Result<Option<ContractTerms>> {
        self.records.get(contract_id)
    }

    pub fn letter_of_credit(&self, contract_id: &str) -> Result<Option<LetterOfCredit>> {
        self.records.get(&LetterOfCredit::key_for(contract_id))
    }

    pub fn contract_index(&self) -> Result<Vec<String>> {
        Index::CONTRACTS.read(&self.records)
    }

    pub fn shipment_index(&self) -> Result<Vec<String>> {
        Index::SHIPMENTS.read(&self.records)
    }

    /// Value the next notification will carry.
    pub fn event_counter(&self) -> Result<u64> {
        read_counter(&self.records)
    }

    /// Whether the contract's product type appears in the contract index.
    ///
    /// `false` means the terms were written but the index append never
    /// landed. The index holds product types, so a second contract with the
    /// same product also satisfies this check.
    pub fn contract_indexed(&self, contract_id: &str) -> Result<bool> {
        let terms = self
            .contract_terms(contract_id)?
            .ok_or_else(|| LedgerError::NotFound(contract_id.to_string()))?;
        Index::CONTRACTS.contains(&self.records, &terms.product_type)
    }
}
