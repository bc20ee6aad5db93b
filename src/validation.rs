//! Argument validation for each operation.
//!
//! Validators are pure: they inspect positional string arguments and either
//! return typed arguments or the first violation found. Positions in errors
//! are 1-based, matching how callers number their arguments.

use crate::error::{LedgerError, Result, ShapeViolation};
use crate::types::{LetterOfCredit, Party, ShipmentActivity, Timestamp};

/// Validated arguments of `init`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitArgs {
    pub holding: i64,
}

/// Validated arguments of `init_contract_terms`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractTermsArgs {
    pub contract_id: String,
    /// Lowercased.
    pub product_type: String,
    pub max_temperature_f: i64,
}

/// Validated arguments of `create_loc`.
///
/// `value` is carried unchecked: it may be empty or non-numeric until a
/// record is actually built from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LetterOfCreditArgs {
    pub contract_id: String,
    pub description: String,
    pub value: String,
    pub importer: String,
    pub exporter: String,
    pub shipping_co: String,
    pub customs: String,
    pub port_of_loading: String,
    pub port_of_entry: String,
}

impl LetterOfCreditArgs {
    /// Build the stored record, parsing `value` (argument 3).
    pub fn into_record(self, timestamp: Timestamp) -> Result<LetterOfCredit> {
        let value = parse_integer(&self.value, 3, "value_dollars")?;
        Ok(LetterOfCredit {
            contract_id: self.contract_id,
            description: self.description,
            value,
            importer: Party::company(self.importer),
            exporter: Party::company(self.exporter),
            shipping_co: self.shipping_co,
            customs: self.customs,
            port_of_loading: self.port_of_loading,
            port_of_entry: self.port_of_entry,
            timestamp,
        })
    }
}

/// Validated arguments of `shipment_activity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShipmentArgs {
    pub contract_id: String,
    pub value: i64,
    pub start_temp_f: i64,
    pub end_temp_f: i64,
    pub carrier_name: String,
    pub location: String,
    pub ship_event: String,
}

impl ShipmentArgs {
    pub fn into_record(self, timestamp: Timestamp) -> ShipmentActivity {
        ShipmentActivity {
            contract_id: self.contract_id,
            value: self.value,
            start_temp_f: self.start_temp_f,
            end_temp_f: self.end_temp_f,
            carrier_name: self.carrier_name,
            location: self.location,
            ship_event: self.ship_event,
            timestamp,
        }
    }
}

pub fn validate_init(args: &[String]) -> Result<InitArgs> {
    expect_count("init", args, 1)?;
    let holding = parse_integer(&args[0], 1, "holding")?;
    Ok(InitArgs { holding })
}

pub fn validate_contract_terms(args: &[String]) -> Result<ContractTermsArgs> {
    expect_count("init_contract_terms", args, 3)?;
    let contract_id = non_empty(args, 1, "contract_id")?;
    let product_type = non_empty(args, 2, "product_type")?;
    let max_temperature_f = parse_integer(&args[2], 3, "max_temperature_f")?;

    Ok(ContractTermsArgs {
        contract_id: contract_id.to_string(),
        product_type: product_type.to_lowercase(),
        max_temperature_f,
    })
}

/// Arguments: contract id, description, value, importer, exporter,
/// shipping company, customs authority, port of loading, port of entry.
pub fn validate_letter_of_credit(args: &[String]) -> Result<LetterOfCreditArgs> {
    const FIELDS: [&str; 9] = [
        "contract_id",
        "description",
        "value_dollars",
        "importer",
        "exporter",
        "shipping_co",
        "customs_auth",
        "port_of_loading",
        "port_of_entry",
    ];

    expect_count("create_loc", args, FIELDS.len())?;
    for (i, field) in FIELDS.into_iter().enumerate() {
        // value is not checked here
        if i == 2 {
            continue;
        }
        non_empty(args, i + 1, field)?;
    }

    Ok(LetterOfCreditArgs {
        contract_id: args[0].clone(),
        description: args[1].clone(),
        value: args[2].clone(),
        importer: args[3].clone(),
        exporter: args[4].clone(),
        shipping_co: args[5].clone(),
        customs: args[6].clone(),
        port_of_loading: args[7].clone(),
        port_of_entry: args[8].clone(),
    })
}

/// Arguments: contract id, value, start temp, end temp, carrier, location,
/// event label.
pub fn validate_shipment(args: &[String]) -> Result<ShipmentArgs> {
    const FIELDS: [&str; 7] = [
        "contract_id",
        "value_dollars",
        "start_temp_f",
        "end_temp_f",
        "carrier_name",
        "location",
        "shipEvent",
    ];

    expect_count("shipment_activity", args, FIELDS.len())?;
    for (i, field) in FIELDS.into_iter().enumerate() {
        non_empty(args, i + 1, field)?;
    }

    Ok(ShipmentArgs {
        contract_id: args[0].clone(),
        value: parse_integer(&args[1], 2, FIELDS[1])?,
        start_temp_f: parse_integer(&args[2], 3, FIELDS[2])?,
        end_temp_f: parse_integer(&args[3], 4, FIELDS[3])?,
        carrier_name: args[4].clone(),
        location: args[5].clone(),
        ship_event: args[6].clone(),
    })
}

/// Single non-empty key argument, as taken by `query` and delete.
pub fn validate_key<'a>(operation: &str, args: &'a [String]) -> Result<&'a str> {
    expect_count(operation, args, 1)?;
    non_empty(args, 1, "key")
}

fn expect_count(operation: &str, args: &[String], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(LedgerError::argument_count(operation, expected, args.len()));
    }
    Ok(())
}

fn non_empty<'a>(args: &'a [String], position: usize, field: &'static str) -> Result<&'a str> {
    let arg = args[position - 1].as_str();
    if arg.is_empty() {
        return Err(LedgerError::ArgumentShape {
            position,
            field,
            violation: ShapeViolation::Empty,
        });
    }
    Ok(arg)
}

fn parse_integer(arg: &str, position: usize, field: &'static str) -> Result<i64> {
    if arg.is_empty() {
        return Err(LedgerError::ArgumentShape {
            position,
            field,
            violation: ShapeViolation::Empty,
        });
    }
    arg.parse().map_err(|_| LedgerError::ArgumentShape {
        position,
        field,
        violation: ShapeViolation::NotInteger,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn shape<T: std::fmt::Debug>(result: Result<T>) -> (usize, ShapeViolation) {
        match result {
            Err(LedgerError::ArgumentShape {
                position,
                violation,
                ..
            }) => (position, violation),
            other => panic!("Expected ArgumentShape, got {:?}", other),
        }
    }

    #[test]
    fn test_init_requires_integer() {
        assert_eq!(validate_init(&args(&["100"])).unwrap().holding, 100);
        assert_eq!(
            shape(validate_init(&args(&["lots"]))),
            (1, ShapeViolation::NotInteger)
        );
        assert!(matches!(
            validate_init(&args(&[])),
            Err(LedgerError::ArgumentCount { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_contract_terms_lowercases_product() {
        let parsed = validate_contract_terms(&args(&["C100", "Produce", "40"])).unwrap();
        assert_eq!(parsed.contract_id, "C100");
        assert_eq!(parsed.product_type, "produce");
        assert_eq!(parsed.max_temperature_f, 40);
    }

    #[test]
    fn test_contract_terms_violations() {
        assert_eq!(
            shape(validate_contract_terms(&args(&["", "produce", "40"]))),
            (1, ShapeViolation::Empty)
        );
        assert_eq!(
            shape(validate_contract_terms(&args(&["C1", "", "40"]))),
            (2, ShapeViolation::Empty)
        );
        assert_eq!(
            shape(validate_contract_terms(&args(&["C1", "produce", ""]))),
            (3, ShapeViolation::Empty)
        );
        assert_eq!(
            shape(validate_contract_terms(&args(&["C1", "produce", "cold"]))),
            (3, ShapeViolation::NotInteger)
        );
        assert!(matches!(
            validate_contract_terms(&args(&["C1", "produce"])),
            Err(LedgerError::ArgumentCount { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn test_contract_terms_accepts_signed_temperature() {
        let parsed = validate_contract_terms(&args(&["C1", "ice", "-10"])).unwrap();
        assert_eq!(parsed.max_temperature_f, -10);
    }

    #[test]
    fn test_letter_of_credit_value_unchecked() {
        let parsed = validate_letter_of_credit(&args(&[
            "C1", "desc", "", "imp", "exp", "ship", "customs", "load", "entry",
        ]))
        .unwrap();
        assert_eq!(parsed.value, "");

        // Building a record is where the value gets checked.
        let err = parsed.into_record(Timestamp(0)).unwrap_err();
        assert_eq!(shape::<()>(Err(err)), (3, ShapeViolation::Empty));
    }

    #[test]
    fn test_letter_of_credit_reports_first_empty() {
        assert_eq!(
            shape(validate_letter_of_credit(&args(&[
                "C1", "desc", "10", "imp", "", "ship", "customs", "", "entry",
            ]))),
            (5, ShapeViolation::Empty)
        );
        assert!(matches!(
            validate_letter_of_credit(&args(&["C1"])),
            Err(LedgerError::ArgumentCount { expected: 9, got: 1, .. })
        ));
    }

    #[test]
    fn test_letter_of_credit_record() {
        let record = validate_letter_of_credit(&args(&[
            "C1", "bananas", "5000", "Imp Co", "Exp Co", "Ship Co", "CBP", "Manzanillo",
            "Savannah",
        ]))
        .unwrap()
        .into_record(Timestamp(42))
        .unwrap();

        assert_eq!(record.value, 5000);
        assert_eq!(record.importer, Party::company("Imp Co"));
        assert_eq!(record.port_of_entry, "Savannah");
        assert_eq!(record.timestamp, Timestamp(42));
    }

    #[test]
    fn test_shipment_numeric_positions() {
        let parsed = validate_shipment(&args(&[
            "C100", "500", "35", "38", "CarrierX", "Savannah", "departed",
        ]))
        .unwrap();
        assert_eq!(parsed.value, 500);
        assert_eq!(parsed.start_temp_f, 35);
        assert_eq!(parsed.end_temp_f, 38);

        assert_eq!(
            shape(validate_shipment(&args(&[
                "C100", "500", "warm", "38", "CarrierX", "Savannah", "departed",
            ]))),
            (3, ShapeViolation::NotInteger)
        );
    }

    #[test]
    fn test_shipment_emptiness_checked_before_numbers() {
        // Position 2 is non-numeric but position 7 is empty: emptiness wins.
        assert_eq!(
            shape(validate_shipment(&args(&[
                "C100", "lots", "35", "38", "CarrierX", "Savannah", "",
            ]))),
            (7, ShapeViolation::Empty)
        );
    }

    #[test]
    fn test_key_argument() {
        let a = args(&["C1"]);
        assert_eq!(validate_key("query", &a).unwrap(), "C1");
        assert_eq!(shape(validate_key("query", &args(&[""]))), (1, ShapeViolation::Empty));
        assert!(matches!(
            validate_key("query", &args(&["a", "b"])),
            Err(LedgerError::ArgumentCount { .. })
        ));
    }
}
