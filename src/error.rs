//! Error types for the trade ledger.

use std::fmt;
use thiserror::Error;

/// Why a positional argument was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeViolation {
    /// The argument was an empty string.
    Empty,
    /// The argument did not parse as an integer.
    NotInteger,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeViolation::Empty => write!(f, "must be a non-empty string"),
            ShapeViolation::NotInteger => write!(f, "must be an integer"),
        }
    }
}

/// Main error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Incorrect number of arguments for {operation}: expected {expected}, got {got}")]
    ArgumentCount {
        operation: String,
        expected: usize,
        got: usize,
    },

    #[error("Argument {position} ({field}) {violation}")]
    ArgumentShape {
        position: usize,
        field: &'static str,
        violation: ShapeViolation,
    },

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Ledger store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Index {index} unavailable: {reason}")]
    IndexUnavailable { index: String, reason: String },

    #[error("Received unknown function invocation: {0}")]
    UnknownOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Ledger journal is locked by another process")]
    Locked,
}

/// Fieldless discriminant of [`LedgerError`], for callers that only branch on the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArgumentCount,
    ArgumentShape,
    AlreadyExists,
    NotFound,
    StoreUnavailable,
    IndexUnavailable,
    UnknownOperation,
    Io,
    Serialization,
    Deserialization,
    Corruption,
    Locked,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ArgumentCount { .. } => ErrorKind::ArgumentCount,
            LedgerError::ArgumentShape { .. } => ErrorKind::ArgumentShape,
            LedgerError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            LedgerError::NotFound(_) => ErrorKind::NotFound,
            LedgerError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            LedgerError::IndexUnavailable { .. } => ErrorKind::IndexUnavailable,
            LedgerError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            LedgerError::Io(_) => ErrorKind::Io,
            LedgerError::Serialization(_) => ErrorKind::Serialization,
            LedgerError::Deserialization(_) => ErrorKind::Deserialization,
            LedgerError::Corruption(_) => ErrorKind::Corruption,
            LedgerError::Locked => ErrorKind::Locked,
        }
    }

    pub(crate) fn argument_count(operation: &str, expected: usize, got: usize) -> Self {
        LedgerError::ArgumentCount {
            operation: operation.to_string(),
            expected,
            got,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for LedgerError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for LedgerError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        LedgerError::Deserialization(e.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_message_names_position() {
        let err = LedgerError::ArgumentShape {
            position: 3,
            field: "max_temperature_f",
            violation: ShapeViolation::NotInteger,
        };
        assert_eq!(
            err.to_string(),
            "Argument 3 (max_temperature_f) must be an integer"
        );
        assert_eq!(err.kind(), ErrorKind::ArgumentShape);
    }

    #[test]
    fn test_count_message() {
        let err = LedgerError::argument_count("init_contract_terms", 3, 2);
        assert_eq!(
            err.to_string(),
            "Incorrect number of arguments for init_contract_terms: expected 3, got 2"
        );
    }
}
