//! Transaction Aggregator CLI
//!
//! Command-line interface for categorizing bank transactions and writing
//! spending summaries.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- ingest transactions.csv > categories.csv
//! cargo run -- ingest --strategy sync --report account transactions.csv > accounts.csv
//! cargo run -- ingest --workers 8 --queue-capacity 500 transactions.csv
//! cargo run -- simulate --batches 3 --interval-ms 1000 --seed 7
//! cargo run -- --log-level debug simulate
//! ```
//!
//! Reports are written to stdout and logs to stderr.
//!
//! # Commands
//!
//! - **ingest**: Read a CSV file, categorize every valid row and report
//! - **simulate**: Publish sample batches on a schedule until the batch limit
//!   or Ctrl-C, then report
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, duplicate transaction ids in sync mode, etc.)

use std::process;

use tracing::info;
use transaction_aggregator::cli::{self, Command};
use transaction_aggregator::logging::init_tracing;
use transaction_aggregator::strategy;
use transaction_aggregator::types::AggregationResult;

fn main() {
    let args = cli::parse_args();
    init_tracing(&args.log_level);

    let mut output = std::io::stdout();
    let result: Result<AggregationResult, String> = match &args.command {
        Command::Ingest(ingest) => {
            let config = match ingest.strategy {
                cli::StrategyType::Queued => Some(ingest.to_queued_config()),
                cli::StrategyType::Sync => None,
            };
            strategy::create_strategy(ingest.strategy, config).process(
                &ingest.input_file,
                ingest.report,
                &mut output,
            )
        }
        Command::Simulate(simulate) => {
            strategy::run_simulation(simulate.to_simulation_config(), simulate.report, &mut output)
        }
    };

    match result {
        Ok(result) => info!(total_read = result.total_read(), "{}", result.message),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
