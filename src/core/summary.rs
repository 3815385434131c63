//! Grouped totals over persisted transactions
//!
//! Summaries are recomputed from the repository on every call. They are
//! read-only and idempotent: calling them twice without intervening saves
//! yields the same output.

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::traits::TransactionRepository;
use crate::types::{AccountSummary, CategorySummary, StoredTransaction, SummaryRecord};

/// Summarize every stored transaction by category
///
/// Sorted by total amount descending; ties keep category declaration order.
pub fn summarize_by_category(repository: &dyn TransactionRepository) -> Vec<CategorySummary> {
    category_summary(&repository.find_all())
}

/// Summarize every stored transaction by account number, sorted ascending
pub fn summarize_by_account(repository: &dyn TransactionRepository) -> Vec<AccountSummary> {
    account_summary(&repository.find_all())
}

/// Category summary over an explicit set of records
pub fn category_summary(records: &[StoredTransaction]) -> Vec<CategorySummary> {
    let mut summary: Vec<CategorySummary> =
        group(records, |stored| stored.transaction.category());

    // Stable sort over BTreeMap order keeps ties in declaration order
    summary.sort_by_key(|record| Reverse(record.total_amount));
    summary
}

/// Account summary over an explicit set of records
pub fn account_summary(records: &[StoredTransaction]) -> Vec<AccountSummary> {
    group(records, |stored| stored.transaction.account_number.clone())
}

fn group<K, F>(records: &[StoredTransaction], key: F) -> Vec<SummaryRecord<K>>
where
    K: Ord,
    F: Fn(&StoredTransaction) -> K,
{
    let mut groups: BTreeMap<K, (u64, Decimal)> = BTreeMap::new();

    for stored in records {
        let (count, total) = groups.entry(key(stored)).or_insert((0, Decimal::ZERO));
        *count += 1;
        *total += stored.transaction.amount;
    }

    groups
        .into_iter()
        .map(|(key, (transaction_count, total_amount))| SummaryRecord {
            key,
            transaction_count,
            total_amount,
        })
        .collect()
}
