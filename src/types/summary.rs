//! Summary types for grouped transaction totals
//!
//! Summaries are derived from persisted transactions on every request and are
//! never stored themselves.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::transaction::{Category, SourceType};

/// Grouped totals for one key
///
/// `total_amount` is the arithmetic sum of signed amounts, so credits and
/// debits in the same group offset each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord<K> {
    /// Grouping key (a category or an account number)
    pub key: K,

    /// Number of transactions in the group
    pub transaction_count: u64,

    /// Sum of signed amounts in the group
    pub total_amount: Decimal,
}

/// Totals for one category
pub type CategorySummary = SummaryRecord<Category>;

/// Totals for one account number
pub type AccountSummary = SummaryRecord<String>;

/// Outcome of ingesting a set of raw transactions
///
/// `by_source_type` counts records read from the input (or published by the
/// producer) per channel, while `total_processed` counts the records that were
/// categorized and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregationResult {
    pub total_processed: u64,
    pub by_source_type: BTreeMap<SourceType, u64>,
    pub message: String,
}

impl AggregationResult {
    /// Build a result with the standard completion message
    pub fn new(total_processed: u64, by_source_type: BTreeMap<SourceType, u64>) -> Self {
        Self {
            total_processed,
            by_source_type,
            message: format!("Successfully aggregated {} transactions", total_processed),
        }
    }

    /// Total number of records read across all source types
    pub fn total_read(&self) -> u64 {
        self.by_source_type.values().sum()
    }
}
