//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait for one-shot ingestion of a whole file.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Categorization to `RuleEngine`
//! - Persistence to `InMemoryTransactionRepository::save_all`
//! - CSV output to `write_report`
//!
//! Every valid row is categorized first and the whole set is saved in one
//! `save_all` call. A duplicate transaction id fails the run, since a
//! one-shot ingestion is all or nothing.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::cli::ReportKind;
use crate::core::{InMemoryTransactionRepository, RuleEngine, TransactionRepository};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{write_report, ProcessingStrategy};
use crate::types::AggregationResult;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use transaction_aggregator::cli::ReportKind;
/// use transaction_aggregator::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy;
/// let mut output = io::stdout();
///
/// strategy
///     .process(Path::new("transactions.csv"), ReportKind::Category, &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<AggregationResult, String> {
        let started = Instant::now();

        let engine = RuleEngine::standard()
            .map_err(|e| format!("Failed to compile categorization rules: {}", e))?;
        let repository = InMemoryTransactionRepository::new();
        let reader = SyncReader::new(input_path)?;

        let mut by_source_type = BTreeMap::new();
        let mut categorized = Vec::new();

        for result in reader {
            match result {
                Ok(raw) => {
                    *by_source_type.entry(raw.source_type).or_insert(0) += 1;
                    categorized.push(engine.categorize(raw));
                }
                Err(e) => warn!(error = %e, "Skipping rejected row"),
            }
        }

        info!(count = categorized.len(), "Saving categorized transactions");
        let saved = repository
            .save_all(categorized)
            .map_err(|e| format!("Failed to save transactions: {}", e))?;

        write_report(report, &repository, output)?;

        let result = AggregationResult::new(saved.len() as u64, by_source_type);
        info!(
            total_processed = result.total_processed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Transaction aggregation completed"
        );

        Ok(result)
    }
}
