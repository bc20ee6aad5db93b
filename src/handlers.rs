//! Operation handlers.
//!
//! Each handler validates its arguments first and writes nothing if they are
//! rejected. After validation a handler is a sequence of individually atomic
//! ledger calls: an entity write followed by an index append. A failure in the
//! index step leaves the entity written and unindexed.

use crate::error::{LedgerError, Result};
use crate::ledger::LedgerStore;
use crate::records::{Index, RecordStore};
use crate::types::{
    ContractTerms, LetterOfCredit, ShipmentActivity, Timestamp, EVENT_COUNTER_KEY, HOLDING_KEY,
    INITIAL_EVENT_COUNTER,
};
use crate::validation;
use tracing::{debug, info, warn};

/// Write the holding value, empty indices and a fresh event counter.
///
/// Safe to repeat: every call leaves the same bookkeeping state behind.
/// Entity records from before the reset are left in place.
pub fn initialize<L: LedgerStore>(store: &RecordStore<L>, args: &[String]) -> Result<()> {
    let parsed = validation::validate_init(args)?;

    info!(holding = parsed.holding, "initializing ledger");

    store.put_raw(HOLDING_KEY, parsed.holding.to_string().into_bytes())?;
    Index::CONTRACTS.reset(store)?;
    Index::SHIPMENTS.reset(store)?;
    store.put_raw(
        EVENT_COUNTER_KEY,
        INITIAL_EVENT_COUNTER.to_string().into_bytes(),
    )?;

    Ok(())
}

/// Create contract terms under their identifier, then index the product type.
///
/// A record already stored under the identifier with the same `contractID`
/// rejects the call with `AlreadyExists` and nothing is written.
pub fn define_contract_terms<L: LedgerStore>(
    store: &RecordStore<L>,
    args: &[String],
) -> Result<ContractTerms> {
    let parsed = validation::validate_contract_terms(args)?;

    if let Some(existing) = store.get::<ContractTerms>(&parsed.contract_id)? {
        if existing.contract_id == parsed.contract_id {
            return Err(LedgerError::AlreadyExists(format!(
                "Terms of Contract for product {} already exists",
                existing.contract_id
            )));
        }
        warn!(
            key = %parsed.contract_id,
            stored_id = %existing.contract_id,
            "overwriting contract terms stored under a different identifier"
        );
    }

    let terms = ContractTerms {
        contract_id: parsed.contract_id,
        product_type: parsed.product_type,
        max_temperature_f: parsed.max_temperature_f,
    };

    store.put(&terms.contract_id, &terms)?;
    // The contract index lists product types, not identifiers.
    Index::CONTRACTS.append(store, &terms.product_type)?;

    info!(
        contract_id = %terms.contract_id,
        product = %terms.product_type,
        max_temperature_f = terms.max_temperature_f,
        "defined contract terms"
    );
    Ok(terms)
}

/// Validate a letter of credit; with `persist`, store it under `{id}/loc`.
///
/// Returns the key written, if any. Whether the contract exists is not checked.
pub fn open_letter_of_credit<L: LedgerStore>(
    store: &RecordStore<L>,
    args: &[String],
    persist: bool,
) -> Result<Option<String>> {
    let parsed = validation::validate_letter_of_credit(args)?;

    if !persist {
        debug!(contract_id = %parsed.contract_id, "letter of credit validated");
        return Ok(None);
    }

    let key = LetterOfCredit::key_for(&parsed.contract_id);
    if store.exists(&key)? {
        return Err(LedgerError::AlreadyExists(key));
    }

    let record = parsed.into_record(Timestamp::now())?;
    store.put(&key, &record)?;

    info!(key = %key, value = record.value, "opened letter of credit");
    Ok(Some(key))
}

/// Validate shipment activity; with `persist`, store it and index its key.
///
/// Records land under `{id}/shipment/{n}`, `n` being the next free position
/// after the current shipment index length. Whether the contract exists is
/// not checked.
pub fn record_shipment_activity<L: LedgerStore>(
    store: &RecordStore<L>,
    args: &[String],
    persist: bool,
) -> Result<Option<String>> {
    let parsed = validation::validate_shipment(args)?;

    if !persist {
        debug!(contract_id = %parsed.contract_id, "shipment activity validated");
        return Ok(None);
    }

    let mut position = Index::SHIPMENTS.read(store)?.len() + 1;
    let mut key = ShipmentActivity::key_for(&parsed.contract_id, position);
    // Records outlive an index reset; never overwrite one.
    while store.exists(&key)? {
        position += 1;
        key = ShipmentActivity::key_for(&parsed.contract_id, position);
    }

    let record = parsed.into_record(Timestamp::now());
    store.put(&key, &record)?;
    Index::SHIPMENTS.append(store, &key)?;

    info!(key = %key, event = %record.ship_event, "recorded shipment activity");
    Ok(Some(key))
}

/// Delete the record at the single key argument.
///
/// Index entries referring to the record are left untouched.
pub fn delete_record<L: LedgerStore>(store: &RecordStore<L>, args: &[String]) -> Result<()> {
    let key = validation::validate_key("delete", args)?;

    if !store.exists(key)? {
        return Err(LedgerError::NotFound(key.to_string()));
    }
    store.delete(key)?;

    info!(key, "deleted record");
    Ok(())
}

/// Stored bytes of the record at the single key argument.
pub fn query_record<L: LedgerStore>(store: &RecordStore<L>, args: &[String]) -> Result<Vec<u8>> {
    let key = validation::validate_key("query", args)?;
    store
        .get_raw(key)?
        .ok_or_else(|| LedgerError::NotFound(key.to_string()))
}
