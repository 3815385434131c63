//! Processing strategy module for transaction aggregation
//!
//! This module defines the Strategy pattern for complete ingestion runs,
//! covering CSV parsing, categorization, persistence and report output. This
//! allows the synchronous and queued implementations to be selected at runtime.

use crate::cli::{ReportKind, StrategyType};
use crate::core::{summarize_by_account, summarize_by_category, TransactionRepository};
use crate::io::{write_account_summary_csv, write_category_summary_csv};
use crate::types::AggregationResult;
use std::io::Write;
use std::path::Path;

pub mod queued;
pub mod simulation;
pub mod sync;

pub use queued::{QueuedConfig, QueuedProcessingStrategy};
pub use simulation::{run_simulation, SimulationConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete ingestion runs
pub trait ProcessingStrategy: Send + Sync {
    /// Ingest transactions from an input file and write a summary report
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing raw transactions
    /// * `report` - Which summary to write
    /// * `output` - Mutable reference to a writer for the report
    ///
    /// # Returns
    ///
    /// * `Ok(AggregationResult)` with per-source counts of the records read
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// Rejected rows are logged and skipped; they never fail the run.
    fn process(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<AggregationResult, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create
/// * `config` - Optional configuration for queued processing (ignored for sync)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<QueuedConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Queued => {
            let config = config.unwrap_or_default();
            Box::new(QueuedProcessingStrategy::new(config))
        }
    }
}

/// Write the requested summary of everything in `repository`
pub fn write_report(
    report: ReportKind,
    repository: &dyn TransactionRepository,
    output: &mut dyn Write,
) -> Result<(), String> {
    match report {
        ReportKind::Category => write_category_summary_csv(&summarize_by_category(repository), output),
        ReportKind::Account => write_account_summary_csv(&summarize_by_account(repository), output),
    }
}
