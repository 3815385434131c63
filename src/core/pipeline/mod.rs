//! Queued ingestion pipeline
//!
//! This module wires producers, the bounded queue and the consumer pool
//! together:
//! - `queue` - Bounded FIFO buffer with suspending publish and consume
//! - `consumer_pool` - Workers that categorize and persist queued items
//! - `producer` - Scheduled publishing from a record source
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── PipelineConfig           (queue capacity, workers, shutdown timeout)
//!     ├── Arc<TransactionQueue>    (shared by producers and workers)
//!     └── ConsumerPool             (N workers + PoolStats)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::core::categorizer::RuleEngine;
use crate::core::traits::TransactionRepository;
use crate::types::{AggregatorError, RawTransaction};

pub mod consumer_pool;
pub mod producer;
pub mod queue;

pub use consumer_pool::{ConsumerPool, PoolStats, DEFAULT_WORKER_COUNT};
pub use producer::{Published, RecordSource, SampleFeed, ScheduledProducer};
pub use queue::{TransactionQueue, DEFAULT_QUEUE_CAPACITY};

/// Default time allowed for workers to stop
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the queue and consumer pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum number of buffered items
    pub queue_capacity: usize,
    /// Number of consumer workers
    pub worker_count: usize,
    /// Time allowed for workers to stop before they are aborted
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: DEFAULT_WORKER_COUNT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Create a PipelineConfig, replacing zero sizes with defaults
    pub fn new(queue_capacity: usize, worker_count: usize, shutdown_timeout: Duration) -> Self {
        let default = Self::default();

        let queue_capacity = if queue_capacity == 0 {
            warn!(
                queue_capacity,
                default = default.queue_capacity,
                "Invalid queue capacity, using default"
            );
            default.queue_capacity
        } else {
            queue_capacity
        };

        let worker_count = if worker_count == 0 {
            warn!(
                worker_count,
                default = default.worker_count,
                "Invalid worker count, using default"
            );
            default.worker_count
        } else {
            worker_count
        };

        Self {
            queue_capacity,
            worker_count,
            shutdown_timeout,
        }
    }
}

/// Schedule for a [`ScheduledProducer`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerConfig {
    /// Wait before the first batch
    pub initial_delay: Duration,
    /// Time between batches
    pub interval: Duration,
    /// Stop after this many batches; `None` runs until cancelled
    pub max_batches: Option<u64>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            interval: Duration::from_secs(10),
            max_batches: None,
        }
    }
}

impl ProducerConfig {
    /// Create a ProducerConfig, replacing a zero interval with the default
    pub fn new(initial_delay: Duration, interval: Duration, max_batches: Option<u64>) -> Self {
        let interval = if interval.is_zero() {
            let default = Self::default().interval;
            warn!(default_ms = default.as_millis() as u64, "Invalid producer interval, using default");
            default
        } else {
            interval
        };

        Self {
            initial_delay,
            interval,
            max_batches,
        }
    }
}

/// Running queue plus consumer pool
#[derive(Debug)]
pub struct Pipeline {
    queue: Arc<TransactionQueue>,
    pool: ConsumerPool,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create the queue and spawn the workers on the current tokio runtime
    pub fn start(
        config: PipelineConfig,
        engine: Arc<RuleEngine>,
        repository: Arc<dyn TransactionRepository>,
    ) -> Self {
        let queue = Arc::new(TransactionQueue::new(config.queue_capacity));
        let pool = ConsumerPool::start(
            Arc::clone(&queue),
            engine,
            repository,
            config.worker_count,
        );

        Self {
            queue,
            pool,
            config,
        }
    }

    /// Shared handle for producers
    pub fn queue(&self) -> Arc<TransactionQueue> {
        Arc::clone(&self.queue)
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        self.pool.stats()
    }

    pub async fn publish(&self, transaction: RawTransaction) -> Result<(), AggregatorError> {
        self.queue.publish(transaction).await
    }

    /// Stop the workers within the configured shutdown timeout
    pub async fn shutdown(self) -> Result<(), AggregatorError> {
        self.pool.shutdown(self.config.shutdown_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repository::InMemoryTransactionRepository;
    use rstest::rstest;

    #[rstest]
    #[case::valid(10, 2, 10, 2)]
    #[case::zero_capacity(0, 2, DEFAULT_QUEUE_CAPACITY, 2)]
    #[case::zero_workers(10, 0, 10, DEFAULT_WORKER_COUNT)]
    #[case::both_zero(0, 0, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT)]
    fn test_pipeline_config_new(
        #[case] capacity: usize,
        #[case] workers: usize,
        #[case] expected_capacity: usize,
        #[case] expected_workers: usize,
    ) {
        let config = PipelineConfig::new(capacity, workers, Duration::from_millis(250));

        assert_eq!(config.queue_capacity, expected_capacity);
        assert_eq!(config.worker_count, expected_workers);
        assert_eq!(config.shutdown_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_defaults() {
        let pipeline = PipelineConfig::default();
        assert_eq!(pipeline.queue_capacity, 1000);
        assert_eq!(pipeline.worker_count, 4);
        assert_eq!(pipeline.shutdown_timeout, Duration::from_secs(5));

        let producer = ProducerConfig::default();
        assert_eq!(producer.initial_delay, Duration::from_secs(5));
        assert_eq!(producer.interval, Duration::from_secs(10));
        assert_eq!(producer.max_batches, None);
    }

    #[test]
    fn test_producer_config_zero_interval_uses_default() {
        let config = ProducerConfig::new(Duration::ZERO, Duration::ZERO, Some(1));
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.initial_delay, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_pipeline_start_and_shutdown() {
        let repository = Arc::new(InMemoryTransactionRepository::new());
        let pipeline = Pipeline::start(
            PipelineConfig::new(16, 2, Duration::from_secs(1)),
            Arc::new(RuleEngine::standard().unwrap()),
            repository.clone(),
        );
        assert_eq!(pipeline.queue().capacity(), 16);

        let mut feed = SampleFeed::with_seed(1);
        for raw in feed.next_batch() {
            pipeline.publish(raw).await.unwrap();
        }
        pipeline.stats().wait_for_completed(8).await;

        assert_eq!(repository.count(), 8);
        pipeline.shutdown().await.unwrap();
    }
}
