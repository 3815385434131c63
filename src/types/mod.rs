//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Source types, classifications and transaction records
//! - `summary`: Grouped totals and ingestion results
//! - `error`: Error types for the aggregator

pub mod error;
pub mod summary;
pub mod transaction;

pub use error::AggregatorError;
pub use summary::{AccountSummary, AggregationResult, CategorySummary, SummaryRecord};
pub use transaction::{
    CategorizedTransaction, Category, Classification, RawTransaction, RecordId, SourceType,
    StoredTransaction, Subcategory,
};
