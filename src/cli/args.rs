use crate::core::{PipelineConfig, ProducerConfig};
use crate::strategy::{QueuedConfig, SimulationConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Categorize bank transactions and summarize them by category or account
#[derive(Parser, Debug)]
#[command(name = "transaction-aggregator")]
#[command(about = "Categorize bank transactions and report spending summaries", long_about = None)]
pub struct CliArgs {
    /// Log filter used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        help = "Log level or filter directive (overridden by RUST_LOG)"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Aggregate a CSV file of raw transactions
    Ingest(IngestArgs),

    /// Generate sample transactions on a schedule until interrupted
    Simulate(SimulateArgs),
}

/// Arguments for one-shot file ingestion
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Input CSV file path containing raw transactions
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "queued",
        help = "Processing strategy: 'sync' for a single pass or 'queued' for the worker pipeline"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "category",
        help = "Summary to write: 'category' or 'account'"
    )]
    pub report: ReportKind,

    /// Number of rows read per batch (queued mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows read per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments for the scheduled sample producer
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Stop after this many batches instead of waiting for Ctrl-C
    #[arg(long = "batches", value_name = "COUNT")]
    pub batches: Option<u64>,

    #[arg(
        long = "interval-ms",
        value_name = "MILLIS",
        default_value_t = 10_000,
        help = "Milliseconds between batches"
    )]
    pub interval_ms: u64,

    #[arg(
        long = "initial-delay-ms",
        value_name = "MILLIS",
        default_value_t = 5_000,
        help = "Milliseconds before the first batch"
    )]
    pub initial_delay_ms: u64,

    /// Seed for a reproducible sample feed
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    #[arg(
        long = "report",
        value_name = "REPORT",
        default_value = "category",
        help = "Summary to write on exit: 'category' or 'account'"
    )]
    pub report: ReportKind,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Queue and worker pool options shared by both commands
#[derive(Args, Debug, Default)]
pub struct PipelineArgs {
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of consumer workers (default: 4)"
    )]
    pub workers: Option<usize>,

    #[arg(
        long = "queue-capacity",
        value_name = "SIZE",
        help = "Maximum number of queued transactions (default: 1000)"
    )]
    pub queue_capacity: Option<usize>,

    #[arg(
        long = "shutdown-timeout-ms",
        value_name = "MILLIS",
        help = "Milliseconds allowed for workers to stop (default: 5000)"
    )]
    pub shutdown_timeout_ms: Option<u64>,
}

/// Available processing strategies for file ingestion
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Queued,
}

/// Available summary reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Category,
    Account,
}

impl PipelineArgs {
    /// Create a PipelineConfig from the provided options
    ///
    /// Missing options take their defaults; zero sizes are replaced with
    /// defaults by `PipelineConfig::new`, which logs a warning.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig::new(
            self.queue_capacity.unwrap_or(default.queue_capacity),
            self.workers.unwrap_or(default.worker_count),
            self.shutdown_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default.shutdown_timeout),
        )
    }
}

impl IngestArgs {
    /// Create a QueuedConfig from CLI arguments
    pub fn to_queued_config(&self) -> QueuedConfig {
        QueuedConfig::new(
            self.batch_size.unwrap_or(QueuedConfig::default().batch_size),
            self.pipeline.to_pipeline_config(),
        )
    }
}

impl SimulateArgs {
    /// Create a SimulationConfig from CLI arguments
    pub fn to_simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            pipeline: self.pipeline.to_pipeline_config(),
            producer: ProducerConfig::new(
                Duration::from_millis(self.initial_delay_ms),
                Duration::from_millis(self.interval_ms),
                self.batches,
            ),
            seed: self.seed,
        }
    }
}
