//! Core business logic module
//!
//! This module contains the core transaction aggregation components:
//! - `rules` - Categorization rule tables as data
//! - `categorizer` - Compiled rule engine and merchant name extraction
//! - `traits` - Storage abstraction and listing filters
//! - `repository` - Thread-safe in-memory storage
//! - `summary` - Grouped totals by category and account
//! - `pipeline` - Bounded queue, consumer pool and scheduled producer

pub mod categorizer;
pub mod pipeline;
pub mod repository;
pub mod rules;
pub mod summary;
pub mod traits;

pub use categorizer::RuleEngine;
pub use pipeline::{Pipeline, PipelineConfig, ProducerConfig};
pub use repository::InMemoryTransactionRepository;
pub use rules::RuleBook;
pub use summary::{summarize_by_account, summarize_by_category};
pub use traits::{TransactionFilter, TransactionRepository};
