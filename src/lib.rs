//! Transaction Aggregator Library
//! # Overview
//!
//! This library categorizes raw bank transactions from several channels
//! (card, EFT, debit order, bank fee) into spending categories, stores them
//! and summarizes them by category or by account. Transactions arrive either
//! from a CSV file or from a scheduled producer feeding a bounded queue.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (RawTransaction, Category, summaries, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::rules`] - Keyword rule tables
//!   - [`core::categorizer`] - Rule engine and merchant name extraction
//!   - [`core::repository`] - Thread-safe in-memory transaction storage
//!   - [`core::summary`] - Category and account summaries
//!   - [`core::pipeline`] - Bounded queue, consumer pool and scheduled producer
//! - [`io`] - CSV input and summary output
//! - [`strategy`] - Sync and queued ingestion runs plus the simulation
//! - [`logging`] - Tracing subscriber setup
//!
//! # Categorization
//!
//! Priority rules (income, refunds) apply to every channel. Each channel
//! then has its own ordered keyword rules and a fallback classification.
//! Records from a channel without rules are classified by the sign of the
//! amount.
//!
//! # Summaries
//!
//! - Category summaries are sorted by total amount, largest first
//! - Account summaries are sorted by account number

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{
    InMemoryTransactionRepository, Pipeline, PipelineConfig, RuleEngine, TransactionFilter,
    TransactionRepository,
};
pub use io::{write_account_summary_csv, write_category_summary_csv};
pub use types::{
    AggregationResult, AggregatorError, CategorizedTransaction, Category, RawTransaction,
    SourceType, StoredTransaction, Subcategory,
};
