//! Queued processing strategy
//!
//! This module provides a concurrent implementation of the ProcessingStrategy
//! trait that feeds a CSV file through the same queue and consumer pool used
//! for continuous ingestion.
//!
//! # Architecture
//!
//! ```text
//! QueuedProcessingStrategy
//!     ├── QueuedConfig (batch_size, PipelineConfig)
//!     ├── AsyncReader (batch CSV reading)
//!     └── Pipeline
//!         ├── TransactionQueue (bounded, suspending publish)
//!         └── ConsumerPool (N workers: categorize + save)
//!             └── InMemoryTransactionRepository (thread-safe storage)
//! ```
//!
//! The reader publishes each batch into the queue, waits until every
//! published record has been completed by the workers, then shuts the pool
//! down and writes the report. Persistence order across workers is not
//! deterministic, but the summaries are, so both strategies produce the same
//! report for the same input.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{info, warn};

use crate::cli::ReportKind;
use crate::core::{InMemoryTransactionRepository, Pipeline, PipelineConfig, RuleEngine};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{write_report, ProcessingStrategy};
use crate::types::AggregationResult;

/// Default number of rows read per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Configuration for queued processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedConfig {
    /// Number of rows read from the file per batch
    pub batch_size: usize,
    /// Queue and consumer pool settings
    pub pipeline: PipelineConfig,
}

impl Default for QueuedConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl QueuedConfig {
    /// Create a QueuedConfig, replacing a zero batch size with the default
    pub fn new(batch_size: usize, pipeline: PipelineConfig) -> Self {
        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = DEFAULT_BATCH_SIZE,
                "Invalid batch size, using default"
            );
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };

        Self {
            batch_size,
            pipeline,
        }
    }
}

/// Queued processing strategy
///
/// Owns its tokio runtime for the duration of one `process` call.
#[derive(Debug, Clone)]
pub struct QueuedProcessingStrategy {
    config: QueuedConfig,
}

impl QueuedProcessingStrategy {
    pub fn new(config: QueuedConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for QueuedProcessingStrategy {
    /// Process transactions through the queue and consumer pool
    ///
    /// 1. Creates a multi-threaded tokio runtime
    /// 2. Starts the pipeline with a fresh repository
    /// 3. Reads rows in batches and publishes each record
    /// 4. Waits until every published record is completed
    /// 5. Shuts the pipeline down within the configured timeout
    /// 6. Writes the requested report
    ///
    /// Records the workers fail to save (for example duplicate ids) are
    /// logged and left out of the report.
    fn process(
        &self,
        input_path: &Path,
        report: ReportKind,
        output: &mut dyn Write,
    ) -> Result<AggregationResult, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.pipeline.worker_count.max(1))
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let started = Instant::now();

            let engine = RuleEngine::standard()
                .map_err(|e| format!("Failed to compile categorization rules: {}", e))?;
            let repository = Arc::new(InMemoryTransactionRepository::new());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let mut reader = AsyncReader::new(file.compat());

            let pipeline = Pipeline::start(
                self.config.pipeline.clone(),
                Arc::new(engine),
                repository.clone(),
            );
            let stats = pipeline.stats();

            let mut by_source_type = BTreeMap::new();
            let mut published: u64 = 0;

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for raw in batch {
                    *by_source_type.entry(raw.source_type).or_insert(0) += 1;
                    pipeline
                        .publish(raw)
                        .await
                        .map_err(|e| format!("Failed to publish transaction: {}", e))?;
                    published += 1;
                }
            }

            stats.wait_for_completed(published).await;
            pipeline
                .shutdown()
                .await
                .map_err(|e| format!("Failed to stop consumers: {}", e))?;

            if stats.failed() > 0 {
                warn!(failed = stats.failed(), "Some transactions were not saved");
            }

            write_report(report, repository.as_ref(), output)?;

            let result = AggregationResult::new(stats.processed(), by_source_type);
            info!(
                total_processed = result.total_processed,
                rejected_rows = reader.rejected(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Transaction aggregation completed"
            );

            Ok(result)
        })
    }
}
