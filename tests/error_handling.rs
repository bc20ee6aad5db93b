//! Error handling and partial-failure tests.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use trade_ledger::{
    Engine, ErrorKind, LedgerError, LedgerStore, MemoryLedger, Result, ShapeViolation,
    CONTRACT_INDEX_KEY, EVENT_COUNTER_KEY,
};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Ledger that fails or panics on chosen keys.
#[derive(Default)]
struct FaultyLedger {
    inner: MemoryLedger,
    failing_puts: Mutex<HashSet<String>>,
    failing_gets: Mutex<HashSet<String>>,
    panicking_puts: Mutex<HashSet<String>>,
}

impl FaultyLedger {
    fn fail_put(&self, key: &str) {
        self.failing_puts.lock().insert(key.to_string());
    }

    fn fail_get(&self, key: &str) {
        self.failing_gets.lock().insert(key.to_string());
    }

    fn panic_on_put(&self, key: &str) {
        self.panicking_puts.lock().insert(key.to_string());
    }

    fn heal(&self) {
        self.failing_puts.lock().clear();
        self.failing_gets.lock().clear();
        self.panicking_puts.lock().clear();
    }
}

impl LedgerStore for FaultyLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.failing_gets.lock().contains(key) {
            return Err(LedgerError::StoreUnavailable(format!("get {} refused", key)));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if self.panicking_puts.lock().contains(key) {
            panic!("backend crashed writing {}", key);
        }
        if self.failing_puts.lock().contains(key) {
            return Err(LedgerError::StoreUnavailable(format!("put {} refused", key)));
        }
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
}

fn faulty_engine() -> (Arc<FaultyLedger>, Engine<Arc<FaultyLedger>>) {
    let ledger = Arc::new(FaultyLedger::default());
    let engine = Engine::new(Arc::clone(&ledger));
    engine.initialize(&args(&["100"])).unwrap();
    (ledger, engine)
}

// --- Validation Errors ---

#[test]
fn test_wrong_argument_count() {
    let (_, engine) = faulty_engine();

    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce"]))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ArgumentCount {
            expected: 3,
            got: 2,
            ..
        }
    ));
    assert!(engine.contract_terms("C1").unwrap().is_none());
    assert_eq!(engine.event_counter().unwrap(), 2);
}

#[test]
fn test_non_numeric_temperature() {
    let (_, engine) = faulty_engine();

    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "chilly"]))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ArgumentShape {
            position: 3,
            violation: ShapeViolation::NotInteger,
            ..
        }
    ));
    assert!(engine.contract_index().unwrap().is_empty());
}

#[test]
fn test_shipment_rejections_write_nothing() {
    let (ledger, engine) = faulty_engine();
    let keys_before = ledger.inner.keys();

    let cases = [
        args(&["C1", "500", "35"]),
        args(&["", "500", "35", "38", "CarrierX", "Savannah", "departed"]),
        args(&["C1", "500", "35", "hot", "CarrierX", "Savannah", "departed"]),
    ];
    let kinds: Vec<ErrorKind> = cases
        .iter()
        .map(|a| engine.dispatch("shipment_activity", a).unwrap_err().kind())
        .collect();

    assert_eq!(
        kinds,
        vec![
            ErrorKind::ArgumentCount,
            ErrorKind::ArgumentShape,
            ErrorKind::ArgumentShape
        ]
    );
    assert_eq!(ledger.inner.keys(), keys_before);
    assert_eq!(engine.event_counter().unwrap(), 4);
}

#[test]
fn test_init_rejects_non_integer() {
    let (_, engine) = faulty_engine();
    engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap();

    let err = engine.initialize(&args(&["plenty"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentShape);
    // No reset happened.
    assert_eq!(engine.contract_index().unwrap(), vec!["produce"]);
}

// --- Query and Delete ---

#[test]
fn test_query_errors() {
    let (_, engine) = faulty_engine();

    assert_eq!(
        engine.query("lookup", &args(&["abc"])).unwrap_err().kind(),
        ErrorKind::UnknownOperation
    );
    assert_eq!(
        engine.query("query", &[]).unwrap_err().kind(),
        ErrorKind::ArgumentCount
    );
    assert_eq!(
        engine.query("query", &args(&["nobody"])).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_delete_missing_key() {
    let (_, engine) = faulty_engine();
    assert_eq!(
        engine.delete_record(&args(&["nobody"])).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        engine.delete_record(&args(&["a", "b"])).unwrap_err().kind(),
        ErrorKind::ArgumentCount
    );
}

// --- Store Failures ---

#[test]
fn test_index_failure_leaves_entity_unindexed() {
    let (ledger, engine) = faulty_engine();
    ledger.fail_put(CONTRACT_INDEX_KEY);

    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::IndexUnavailable { .. }));

    // Persisted but unindexed, and still counted.
    assert!(engine.contract_terms("C1").unwrap().is_some());
    assert!(!engine.contract_indexed("C1").unwrap());
    assert_eq!(engine.event_counter().unwrap(), 2);

    // Retrying is rejected: the entity already exists.
    ledger.heal();
    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(!engine.contract_indexed("C1").unwrap());
}

#[test]
fn test_entity_write_failure_skips_index() {
    let (ledger, engine) = faulty_engine();
    ledger.fail_put("C1");

    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert!(engine.contract_index().unwrap().is_empty());
    assert_eq!(engine.event_counter().unwrap(), 2);
}

#[test]
fn test_counter_failure_reported_after_successful_handler() {
    let (ledger, engine) = faulty_engine();
    ledger.fail_put(EVENT_COUNTER_KEY);
    let events = engine.subscribe();

    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

    // The handler's writes stand; no notification went out.
    assert_eq!(engine.contract_index().unwrap(), vec!["produce"]);
    assert!(events.try_recv().is_err());
    assert_eq!(engine.event_counter().unwrap(), 1);
}

#[test]
fn test_handler_error_returned_when_counter_unreadable() {
    let (ledger, engine) = faulty_engine();
    ledger.fail_get(EVENT_COUNTER_KEY);

    let err = engine.dispatch("unknown_op", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownOperation);
}

#[test]
fn test_panicking_handler_still_advances_counter() {
    let (ledger, engine) = faulty_engine();
    let events = engine.subscribe();
    ledger.panic_on_put("C1");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        engine.dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
    }));
    assert!(result.is_err());

    assert_eq!(engine.event_counter().unwrap(), 2);
    assert_eq!(
        events.try_recv().unwrap().payload_text().as_deref(),
        Some("Event Counter is 1")
    );

    // The engine stays usable afterwards.
    ledger.heal();
    engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap();
    assert_eq!(engine.event_counter().unwrap(), 3);
}

#[test]
fn test_error_messages() {
    let (_, engine) = faulty_engine();

    let err = engine.dispatch("transfer_funds", &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Received unknown function invocation: transfer_funds"
    );

    engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap();
    let err = engine
        .dispatch("init_contract_terms", &args(&["C1", "produce", "40"]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Record already exists: Terms of Contract for product C1 already exists"
    );
}
