//! Thread-safe in-memory transaction repository
//!
//! This module provides `InMemoryTransactionRepository`, the storage backend
//! used by the CLI and the test suite.
//!
//! # Design
//!
//! Records live in a `DashMap` keyed by record id, with a second `DashMap`
//! indexing external transaction ids. Claiming a slot in the index is the
//! single atomic step that decides whether a save is a duplicate, so two
//! workers racing on the same external id cannot both succeed.
//!
//! ```text
//! save(tx) ──► index.entry(transaction_id) ──occupied──► DuplicateTransaction
//!                     │ vacant: assign next id
//!                     ▼
//!              records.insert(id, StoredTransaction)
//! ```

use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::traits::TransactionRepository;
use crate::types::{AggregatorError, CategorizedTransaction, RecordId, StoredTransaction};

/// In-memory repository backed by concurrent maps
///
/// All methods take `&self` and are safe to call from many workers at once.
#[derive(Debug, Default)]
pub struct InMemoryTransactionRepository {
    /// Stored records by record id
    records: DashMap<RecordId, StoredTransaction>,

    /// Record id by external transaction id
    index: DashMap<String, RecordId>,

    /// Last assigned record id
    last_id: AtomicU64,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored transaction by its external identifier
    pub fn find_by_transaction_id(&self, transaction_id: &str) -> Option<StoredTransaction> {
        let id = *self.index.get(transaction_id)?;
        self.find_by_id(id)
    }
}

impl TransactionRepository for InMemoryTransactionRepository {
    fn save(&self, transaction: CategorizedTransaction) -> Result<StoredTransaction, AggregatorError> {
        let mut assigned = None;
        let id = *self
            .index
            .entry(transaction.transaction_id.clone())
            .or_insert_with(|| {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                assigned = Some(id);
                id
            });

        if assigned != Some(id) {
            return Err(AggregatorError::duplicate_transaction(
                &transaction.transaction_id,
            ));
        }

        let now = Utc::now().naive_utc();
        let stored = StoredTransaction {
            id,
            transaction,
            created_at: now,
            updated_at: now,
        };

        self.records.insert(id, stored.clone());
        Ok(stored)
    }

    fn find_by_id(&self, id: RecordId) -> Option<StoredTransaction> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    fn find_all(&self) -> Vec<StoredTransaction> {
        let mut all: Vec<StoredTransaction> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|stored| stored.id);
        all
    }

    fn count(&self) -> usize {
        self.records.len()
    }
}
