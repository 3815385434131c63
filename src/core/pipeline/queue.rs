//! Bounded FIFO queue between producers and consumer workers
//!
//! # Design
//!
//! The queue wraps a bounded tokio `mpsc` channel. The sending half is shared
//! by every producer; the receiving half sits behind an async mutex so any
//! number of workers can consume from it. Both `publish` and `consume`
//! suspend instead of failing: a full queue parks the publisher until a slot
//! frees, an empty queue parks the consumer until an item arrives.
//!
//! ```text
//! producer ─┐                                     ┌─► worker 1
//! producer ─┼─► Sender ══ [ capacity slots ] ══► Mutex<Receiver> ─┼─► worker 2
//! producer ─┘                                     └─► worker N
//! ```
//!
//! Shutting the queue down wakes every parked caller with `QueueShutdown`.

use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::types::{AggregatorError, RawTransaction};

/// Default number of items the queue can hold
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Bounded multi-producer, multi-consumer transaction queue
#[derive(Debug)]
pub struct TransactionQueue {
    sender: mpsc::Sender<RawTransaction>,
    receiver: Mutex<mpsc::Receiver<RawTransaction>>,
    shutdown: CancellationToken,
    capacity: usize,
}

impl TransactionQueue {
    /// Create a queue holding at most `capacity` items
    ///
    /// A capacity of zero is raised to one; the channel cannot be unbuffered.
    /// Capacities above [`Semaphore::MAX_PERMITS`] are lowered to it.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity > Semaphore::MAX_PERMITS {
            warn!(
                capacity,
                max = Semaphore::MAX_PERMITS,
                "Queue capacity too large, using maximum"
            );
            Semaphore::MAX_PERMITS
        } else {
            capacity.max(1)
        };
        let (sender, receiver) = mpsc::channel(capacity);

        Self {
            sender,
            receiver: Mutex::new(receiver),
            shutdown: CancellationToken::new(),
            capacity,
        }
    }

    /// Append a transaction, waiting while the queue is full
    ///
    /// # Errors
    ///
    /// Returns `QueueShutdown` if the queue is shut down before or while waiting.
    pub async fn publish(&self, transaction: RawTransaction) -> Result<(), AggregatorError> {
        if self.shutdown.is_cancelled() {
            return Err(AggregatorError::QueueShutdown);
        }

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(AggregatorError::QueueShutdown),
            sent = self.sender.send(transaction) => sent.map_err(|_| AggregatorError::QueueShutdown),
        }
    }

    /// Remove and return the oldest transaction, waiting while the queue is empty
    ///
    /// # Errors
    ///
    /// Returns `QueueShutdown` if the queue is shut down before or while waiting.
    pub async fn consume(&self) -> Result<RawTransaction, AggregatorError> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(AggregatorError::QueueShutdown),
            received = async { self.receiver.lock().await.recv().await } => {
                received.ok_or(AggregatorError::QueueShutdown)
            }
        }
    }

    /// Number of items currently buffered
    ///
    /// A snapshot only; it may be stale by the time the caller reads it.
    pub fn size(&self) -> usize {
        self.capacity.saturating_sub(self.sender.capacity())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Wake every parked publisher and consumer with `QueueShutdown`
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Drop every buffered item, returning how many were discarded
    ///
    /// Returns zero without blocking if a consumer currently holds the
    /// receiving half.
    pub fn discard_pending(&self) -> usize {
        let Ok(mut receiver) = self.receiver.try_lock() else {
            return 0;
        };

        let mut discarded = 0;
        while receiver.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}

impl Default for TransactionQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
