//! Scheduled producer publishing batches of raw transactions
//!
//! A [`RecordSource`] supplies batches; the [`ScheduledProducer`] pulls one
//! batch per tick and publishes each record to the queue.
//!
//! ```text
//! ──initial_delay──► tick ──interval──► tick ──interval──► tick ...
//!                     │                  │                  │
//!                 next_batch()       next_batch()       next_batch()
//!                     └─► publish ──► TransactionQueue ◄────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::time::{interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::queue::TransactionQueue;
use super::ProducerConfig;
use crate::types::{RawTransaction, SourceType};

/// Supplier of raw transaction batches
pub trait RecordSource: Send {
    /// Next batch to publish; an empty batch publishes nothing
    fn next_batch(&mut self) -> Vec<RawTransaction>;
}

/// Publishes one batch from a source per interval until stopped
pub struct ScheduledProducer<S> {
    source: S,
    queue: Arc<TransactionQueue>,
    config: ProducerConfig,
    token: CancellationToken,
}

impl<S: RecordSource> ScheduledProducer<S> {
    pub fn new(
        source: S,
        queue: Arc<TransactionQueue>,
        config: ProducerConfig,
        token: CancellationToken,
    ) -> Self {
        Self {
            source,
            queue,
            config,
            token,
        }
    }

    /// Run the schedule and report what was published
    ///
    /// Stops when the token is cancelled, when the queue is shut down, or
    /// after `max_batches` batches.
    pub async fn run(mut self) -> Published {
        let mut published = Published::default();

        tokio::select! {
            biased;
            _ = self.token.cancelled() => return published,
            _ = sleep(self.config.initial_delay) => {}
        }

        let mut ticker = interval(self.config.interval);
        let mut batches: u64 = 0;

        loop {
            if self.config.max_batches.is_some_and(|max| batches >= max) {
                break;
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let batch = self.source.next_batch();
            let batch_size = batch.len();
            info!(batch_size, "Publishing transaction batch");

            for raw in batch {
                let transaction_id = raw.transaction_id.clone();
                let source_type = raw.source_type;
                let outcome = tokio::select! {
                    biased;
                    _ = self.token.cancelled() => return published,
                    outcome = self.queue.publish(raw) => outcome,
                };

                match outcome {
                    Ok(()) => {
                        published.record(source_type);
                        debug!(transaction_id = %transaction_id, "Published transaction");
                    }
                    Err(e) if e.is_shutdown() => {
                        info!(published = published.total, "Queue shut down, producer stopping");
                        return published;
                    }
                    Err(e) => {
                        warn!(
                            transaction_id = %transaction_id,
                            error = %e,
                            "Failed to publish transaction, skipping"
                        );
                    }
                }
            }

            batches += 1;
            info!(
                batch = batches,
                batch_size,
                queue_size = self.queue.size(),
                "Published transaction batch"
            );
        }

        published
    }
}

/// Records a producer published, in total and per source type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Published {
    pub total: u64,
    pub by_source_type: BTreeMap<SourceType, u64>,
}

impl Published {
    fn record(&mut self, source_type: SourceType) {
        self.total += 1;
        *self.by_source_type.entry(source_type).or_insert(0) += 1;
    }
}

const DEBIT_ORDER_PROVIDERS: [&str; 4] = [
    "Discovery Health",
    "Old Mutual Life",
    "DSTV Premium",
    "City of Cape Town",
];

const CARD_MERCHANTS: [&str; 4] = [
    "Woolworths Sandton",
    "Checkers Rosebank",
    "Shell V-Power",
    "Uber Trip #123",
];

/// Random sample transactions in a fixed batch shape
///
/// Each batch holds 2 salary EFTs, 1 monthly service fee, 2 debit orders and
/// 3 card purchases, all with random client and account identifiers.
#[derive(Debug, Clone)]
pub struct SampleFeed {
    rng: StdRng,
}

impl SampleFeed {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Feed with a reproducible sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn record(
        &mut self,
        prefix: &str,
        source_type: SourceType,
        description: &str,
        amount: Decimal,
        now: NaiveDateTime,
    ) -> RawTransaction {
        RawTransaction {
            transaction_id: format!("{}-{:08x}", prefix, self.rng.gen::<u32>()),
            client_id: format!("CLIENT-{:03}", self.rng.gen_range(0..1000)),
            account_number: format!("ACC-{:010}", self.rng.gen_range(0..1_000_000_000u64)),
            source_type,
            description: description.to_string(),
            amount,
            transaction_date: now,
        }
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

impl Default for SampleFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSource for SampleFeed {
    fn next_batch(&mut self) -> Vec<RawTransaction> {
        let now = Local::now().naive_local();
        let mut batch = Vec::with_capacity(8);

        for _ in 0..2 {
            let amount = Decimal::from(45_000 + self.rng.gen_range(0..20_000));
            batch.push(self.record(
                "eft",
                SourceType::Eft,
                "Payment from Acme Corp - Salary",
                amount,
                now,
            ));
        }

        batch.push(self.record(
            "fee",
            SourceType::BankFee,
            "Monthly service fee",
            Decimal::new(-5900, 2),
            now,
        ));

        for _ in 0..2 {
            let provider = self.pick(&DEBIT_ORDER_PROVIDERS);
            let amount = -Decimal::from(200 + self.rng.gen_range(0..1500));
            batch.push(self.record("do", SourceType::DebitOrder, provider, amount, now));
        }

        for _ in 0..3 {
            let merchant = self.pick(&CARD_MERCHANTS);
            let amount = -Decimal::from(50 + self.rng.gen_range(0..500));
            batch.push(self.record("card", SourceType::Card, merchant, amount, now));
        }

        batch
    }
}
