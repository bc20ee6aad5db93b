//! Core types for the trade ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Key of the index listing product types of defined contracts.
pub const CONTRACT_INDEX_KEY: &str = "_contractindex";

/// Key of the index listing shipment record keys.
pub const SHIPMENT_INDEX_KEY: &str = "_shipmentindex";

/// Key of the dispatch event counter.
pub const EVENT_COUNTER_KEY: &str = "event_counter";

/// Key of the scratch holding value written on initialization.
pub const HOLDING_KEY: &str = "abc";

/// Value the event counter takes after initialization.
pub const INITIAL_EVENT_COUNTER: u64 = 1;

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_millis() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Terms agreed for a contract, stored under the contract identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTerms {
    #[serde(rename = "contractID")]
    pub contract_id: String,

    /// Always lowercased.
    #[serde(rename = "product")]
    pub product_type: String,

    pub max_temperature_f: i64,
}

/// A company together with the bank acting for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub company: String,
    #[serde(default)]
    pub bank: Option<String>,
}

impl Party {
    /// A party known only by its company name.
    pub fn company(name: impl Into<String>) -> Self {
        Self {
            company: name.into(),
            bank: None,
        }
    }
}

/// Letter of credit opened against a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterOfCredit {
    #[serde(rename = "contractID")]
    pub contract_id: String,
    pub description: String,
    #[serde(rename = "value_dollars")]
    pub value: i64,
    pub importer: Party,
    pub exporter: Party,
    pub shipping_co: String,
    #[serde(rename = "customs_auth")]
    pub customs: String,
    pub port_of_loading: String,
    pub port_of_entry: String,
    pub timestamp: Timestamp,
}

impl LetterOfCredit {
    /// Ledger key of the letter of credit for a contract.
    pub fn key_for(contract_id: &str) -> String {
        format!("{}/loc", contract_id)
    }
}

/// One leg of shipment activity reported against a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentActivity {
    #[serde(rename = "contractID")]
    pub contract_id: String,
    #[serde(rename = "value_dollars")]
    pub value: i64,
    pub start_temp_f: i64,
    pub end_temp_f: i64,
    pub carrier_name: String,
    pub location: String,
    #[serde(rename = "shipEvent")]
    pub ship_event: String,
    pub timestamp: Timestamp,
}

impl ShipmentActivity {
    /// Ledger key of the `position`-th shipment (1-based, global) for a contract.
    pub fn key_for(contract_id: &str, position: usize) -> String {
        format!("{}/shipment/{}", contract_id, position)
    }
}
