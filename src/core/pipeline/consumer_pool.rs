//! Pool of consumer workers draining the transaction queue
//!
//! # Architecture
//!
//! ```text
//! ConsumerPool
//!     ├── Arc<TransactionQueue>            (shared input)
//!     ├── Arc<RuleEngine>                  (immutable, shared)
//!     ├── Arc<dyn TransactionRepository>   (thread-safe output)
//!     ├── Arc<PoolStats>                   (processed / failed counters)
//!     └── CancellationToken                (pool-wide stop signal)
//! ```
//!
//! Each worker loops: consume, categorize, save. A failure on one item is
//! logged with the item's external id, counted and never retried; the worker
//! moves on to the next item.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::queue::TransactionQueue;
use crate::core::categorizer::RuleEngine;
use crate::core::traits::TransactionRepository;
use crate::types::{AggregatorError, RawTransaction};

/// Default number of consumer workers
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Counters shared by every worker in a pool
#[derive(Debug, Default)]
pub struct PoolStats {
    processed: AtomicU64,
    failed: AtomicU64,
    completed: Notify,
}

impl PoolStats {
    /// Items categorized and saved
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Items that failed categorization or persistence
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Items finished either way
    pub fn completed(&self) -> u64 {
        self.processed() + self.failed()
    }

    /// Wait until at least `target` items have completed
    pub async fn wait_for_completed(&self, target: u64) {
        loop {
            let notified = self.completed.notified();
            tokio::pin!(notified);
            // Register before checking so a completion in between is not missed
            notified.as_mut().enable();

            if self.completed() >= target {
                return;
            }
            notified.await;
        }
    }

    fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        self.completed.notify_waiters();
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.completed.notify_waiters();
    }
}

/// Running set of consumer workers
#[derive(Debug)]
pub struct ConsumerPool {
    workers: Vec<JoinHandle<()>>,
    queue: Arc<TransactionQueue>,
    stats: Arc<PoolStats>,
    token: CancellationToken,
}

impl ConsumerPool {
    /// Spawn `worker_count` workers on the current tokio runtime
    ///
    /// # Arguments
    ///
    /// * `queue` - Queue the workers consume from
    /// * `engine` - Rule engine used to categorize each item
    /// * `repository` - Storage the categorized items are saved to
    /// * `worker_count` - Number of workers; zero is raised to one
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(
        queue: Arc<TransactionQueue>,
        engine: Arc<RuleEngine>,
        repository: Arc<dyn TransactionRepository>,
        worker_count: usize,
    ) -> Self {
        let worker_count = worker_count.max(1);
        let stats = Arc::new(PoolStats::default());
        let token = CancellationToken::new();

        info!(worker_count, "Starting transaction consumers");

        let workers = (1..=worker_count)
            .map(|worker_id| {
                let worker = Worker {
                    worker_id,
                    queue: Arc::clone(&queue),
                    engine: Arc::clone(&engine),
                    repository: Arc::clone(&repository),
                    stats: Arc::clone(&stats),
                    token: token.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self {
            workers,
            queue,
            stats,
            token,
        }
    }

    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop the workers and wait for them, up to `timeout`
    ///
    /// Buffered items that no worker picked up are discarded and counted in
    /// the log.
    ///
    /// # Errors
    ///
    /// Returns `ShutdownTimeout` if some workers had not stopped when the
    /// timeout elapsed; those workers are aborted.
    pub async fn shutdown(self, timeout: Duration) -> Result<(), AggregatorError> {
        info!("Shutting down transaction consumers");

        self.token.cancel();
        self.queue.shutdown();

        let deadline = Instant::now() + timeout;
        let mut remaining = 0;

        for mut worker in self.workers {
            match tokio::time::timeout_at(deadline, &mut worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Consumer worker terminated abnormally"),
                Err(_) => {
                    worker.abort();
                    remaining += 1;
                }
            }
        }

        let discarded = self.queue.discard_pending();
        if discarded > 0 {
            warn!(discarded, "Discarded pending transactions on shutdown");
        }

        info!(
            processed = self.stats.processed(),
            failed = self.stats.failed(),
            "Transaction consumers stopped"
        );

        if remaining > 0 {
            return Err(AggregatorError::ShutdownTimeout {
                timeout_ms: timeout.as_millis(),
                remaining,
            });
        }

        Ok(())
    }
}

struct Worker {
    worker_id: usize,
    queue: Arc<TransactionQueue>,
    engine: Arc<RuleEngine>,
    repository: Arc<dyn TransactionRepository>,
    stats: Arc<PoolStats>,
    token: CancellationToken,
}

impl Worker {
    async fn run(self) {
        info!(worker_id = self.worker_id, "Consumer started");

        loop {
            let raw = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                consumed = self.queue.consume() => match consumed {
                    Ok(raw) => raw,
                    Err(e) if e.is_shutdown() => break,
                    Err(e) => {
                        error!(worker_id = self.worker_id, error = %e, "Consumer failed to read from queue");
                        break;
                    }
                },
            };

            self.process(raw);
        }

        info!(worker_id = self.worker_id, "Consumer stopped");
    }

    fn process(&self, raw: RawTransaction) {
        let transaction_id = raw.transaction_id.clone();
        debug!(
            worker_id = self.worker_id,
            transaction_id = %transaction_id,
            "Consumer received transaction"
        );

        let categorized = self.engine.categorize(raw);

        match self.repository.save(categorized) {
            Ok(stored) => {
                self.stats.record_processed();
                debug!(
                    worker_id = self.worker_id,
                    transaction_id = %transaction_id,
                    record_id = stored.id,
                    classification = %stored.transaction.classification,
                    "Saved categorized transaction"
                );
            }
            Err(e) => {
                self.stats.record_failed();
                error!(
                    worker_id = self.worker_id,
                    transaction_id = %transaction_id,
                    error = %e,
                    "Failed to process transaction"
                );
            }
        }
    }
}
