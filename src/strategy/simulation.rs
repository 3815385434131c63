//! Continuous ingestion with a scheduled sample producer
//!
//! Runs the pipeline against a [`SampleFeed`] on a fixed schedule until the
//! batch limit is reached or the process receives Ctrl-C, then drains the
//! queue, stops the workers and writes the requested report.

use std::io::Write;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::ReportKind;
use crate::core::pipeline::{SampleFeed, ScheduledProducer};
use crate::core::{
    InMemoryTransactionRepository, Pipeline, PipelineConfig, ProducerConfig, RuleEngine,
};
use crate::strategy::write_report;
use crate::types::AggregationResult;

/// Settings for a simulation run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationConfig {
    pub pipeline: PipelineConfig,
    pub producer: ProducerConfig,
    /// Seed for a reproducible feed; random when absent
    pub seed: Option<u64>,
}

/// Run a simulation to completion and write its report
///
/// # Returns
///
/// * `Ok(AggregationResult)` counting published records per source type
/// * `Err(String)` if the runtime or the rule engine could not be created,
///   or the workers did not stop in time
pub fn run_simulation(
    config: SimulationConfig,
    report: ReportKind,
    output: &mut dyn Write,
) -> Result<AggregationResult, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.pipeline.worker_count.max(1))
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

    runtime.block_on(async {
        let engine = RuleEngine::standard()
            .map_err(|e| format!("Failed to compile categorization rules: {}", e))?;
        let repository = Arc::new(InMemoryTransactionRepository::new());
        let pipeline = Pipeline::start(config.pipeline.clone(), Arc::new(engine), repository.clone());

        let feed = match config.seed {
            Some(seed) => SampleFeed::with_seed(seed),
            None => SampleFeed::new(),
        };
        let token = CancellationToken::new();
        let producer =
            ScheduledProducer::new(feed, pipeline.queue(), config.producer.clone(), token.clone());

        info!(
            initial_delay_ms = config.producer.initial_delay.as_millis() as u64,
            interval_ms = config.producer.interval.as_millis() as u64,
            max_batches = ?config.producer.max_batches,
            "Starting simulation"
        );

        let mut handle = tokio::spawn(producer.run());
        let published = tokio::select! {
            joined = &mut handle => joined,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping producer");
                token.cancel();
                handle.await
            }
        }
        .map_err(|e| format!("Producer task failed: {}", e))?;

        let stats = pipeline.stats();
        stats.wait_for_completed(published.total).await;
        pipeline
            .shutdown()
            .await
            .map_err(|e| format!("Failed to stop consumers: {}", e))?;

        write_report(report, repository.as_ref(), output)?;

        let result = AggregationResult::new(stats.processed(), published.by_source_type);
        info!(
            published = published.total,
            total_processed = result.total_processed,
            failed = stats.failed(),
            "Simulation completed"
        );

        Ok(result)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;
    use std::time::Duration;

    fn config(batches: u64) -> SimulationConfig {
        SimulationConfig {
            pipeline: PipelineConfig::new(16, 2, Duration::from_secs(5)),
            producer: ProducerConfig::new(Duration::ZERO, Duration::from_millis(10), Some(batches)),
            seed: Some(11),
        }
    }

    #[test]
    fn test_simulation_processes_every_batch() {
        let mut output = Vec::new();

        let result = run_simulation(config(3), ReportKind::Category, &mut output).unwrap();

        assert_eq!(result.total_processed, 24);
        assert_eq!(result.by_source_type.get(&SourceType::Eft), Some(&6));
        assert_eq!(result.by_source_type.get(&SourceType::BankFee), Some(&3));
        assert_eq!(result.by_source_type.get(&SourceType::DebitOrder), Some(&6));
        assert_eq!(result.by_source_type.get(&SourceType::Card), Some(&9));

        let report = String::from_utf8(output).unwrap();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("category,transaction_count,total_amount"));
        // Salaries dwarf every debit
        assert!(lines.next().unwrap().starts_with("INCOME,6,"));
        assert!(report.contains("BANK_FEES,3,-177.00"));
    }

    #[test]
    fn test_simulation_with_zero_workers_runs_on_one() {
        let mut config = config(1);
        config.pipeline.worker_count = 0;
        let mut output = Vec::new();

        let result = run_simulation(config, ReportKind::Category, &mut output).unwrap();

        assert_eq!(result.total_processed, 8);
        assert_eq!(result.total_read(), 8);
    }

    #[test]
    fn test_simulation_account_report_covers_every_record() {
        let mut output = Vec::new();

        run_simulation(config(2), ReportKind::Account, &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        let counted: u64 = report
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(1).unwrap().parse::<u64>().unwrap())
            .sum();
        assert_eq!(counted, 16);
    }
}
