//! Error types for the transaction aggregator
//!
//! This module defines all error types that can occur while reading,
//! categorizing, queueing and persisting transactions.
//!
//! # Error Categories
//!
//! - **Input Errors**: Malformed CSV rows, unknown source types, bad amounts or timestamps
//! - **Rule Errors**: Rule books whose patterns do not compile or whose outcomes are invalid
//! - **Storage Errors**: Duplicate identifiers, invalid filters, unavailable storage
//! - **Pipeline Errors**: Queue shutdown and bounded shutdown timeouts

use chrono::NaiveDateTime;
use thiserror::Error;

/// Main error type for the transaction aggregator
///
/// Each variant carries the context needed to diagnose the failure. Input
/// and per-item errors are recoverable: the offending record is logged and
/// skipped while the rest of the pipeline keeps running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregatorError {
    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// The malformed row is skipped and processing continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A required field was empty
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Name of the empty field
        field: String,
    },

    /// Source type is not one of EFT, BANK_FEE, DEBIT_ORDER or CARD
    #[error("Invalid source type '{source_type}'{}", transaction_id.as_ref().map(|t| format!(" for transaction {}", t)).unwrap_or_default())]
    InvalidSourceType {
        /// The unrecognised source type string
        source_type: String,
        /// External transaction identifier (if available)
        transaction_id: Option<String>,
    },

    /// Amount field is empty
    #[error("Transaction {transaction_id} requires an amount")]
    MissingAmount {
        /// External transaction identifier
        transaction_id: String,
    },

    /// Amount field could not be parsed as a decimal
    #[error("Invalid amount '{amount}' for transaction {transaction_id}")]
    InvalidAmount {
        /// The invalid amount string
        amount: String,
        /// External transaction identifier
        transaction_id: String,
    },

    /// Transaction timestamp could not be parsed
    #[error("Invalid transaction date '{value}' for transaction {transaction_id}")]
    InvalidTimestamp {
        /// The invalid timestamp string
        value: String,
        /// External transaction identifier
        transaction_id: String,
    },

    /// A categorization rule could not be compiled or has an invalid outcome
    #[error("Invalid rule '{rule}': {message}")]
    InvalidRule {
        /// Rule name
        rule: String,
        /// Why the rule was rejected
        message: String,
    },

    /// A transaction with the same external identifier is already stored
    #[error("Duplicate transaction ID {transaction_id}")]
    DuplicateTransaction {
        /// External transaction identifier
        transaction_id: String,
    },

    /// Filter start date is after its end date
    #[error("Start date {start} must not be after end date {end}")]
    InvalidDateRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// The queue was shut down while a caller was publishing or consuming
    ///
    /// Producers and consumers treat this as a clean stop request.
    #[error("Transaction queue has been shut down")]
    QueueShutdown,

    /// The storage backend rejected or could not complete an operation
    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        /// Description of the storage failure
        message: String,
    },

    /// Workers did not stop within the shutdown timeout
    #[error("Consumer pool did not stop within {timeout_ms}ms ({remaining} workers aborted)")]
    ShutdownTimeout {
        /// Timeout that elapsed
        timeout_ms: u128,
        /// Number of workers still running when the timeout elapsed
        remaining: usize,
    },
}

// Conversion from io::Error to AggregatorError
impl From<std::io::Error> for AggregatorError {
    fn from(error: std::io::Error) -> Self {
        AggregatorError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to AggregatorError
impl From<csv::Error> for AggregatorError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        AggregatorError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl AggregatorError {
    /// Create a MissingField error
    pub fn missing_field(field: &str) -> Self {
        AggregatorError::MissingField {
            field: field.to_string(),
        }
    }

    /// Create an InvalidSourceType error
    pub fn invalid_source_type(source_type: &str, transaction_id: Option<&str>) -> Self {
        AggregatorError::InvalidSourceType {
            source_type: source_type.to_string(),
            transaction_id: transaction_id.map(str::to_string),
        }
    }

    /// Create a MissingAmount error
    pub fn missing_amount(transaction_id: &str) -> Self {
        AggregatorError::MissingAmount {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: &str, transaction_id: &str) -> Self {
        AggregatorError::InvalidAmount {
            amount: amount.to_string(),
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create an InvalidTimestamp error
    pub fn invalid_timestamp(value: &str, transaction_id: &str) -> Self {
        AggregatorError::InvalidTimestamp {
            value: value.to_string(),
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create an InvalidRule error
    pub fn invalid_rule(rule: &str, message: impl Into<String>) -> Self {
        AggregatorError::InvalidRule {
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    /// Create a DuplicateTransaction error
    pub fn duplicate_transaction(transaction_id: &str) -> Self {
        AggregatorError::DuplicateTransaction {
            transaction_id: transaction_id.to_string(),
        }
    }

    /// Create a StorageUnavailable error
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        AggregatorError::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Whether this error is a clean-stop signal rather than a failure
    pub fn is_shutdown(&self) -> bool {
        matches!(self, AggregatorError::QueueShutdown)
    }
}
