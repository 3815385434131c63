//! Transaction-related types for the transaction aggregator
//!
//! This module defines the source channels, the two-level classification
//! (category and subcategory), and the raw, categorized and stored forms a
//! transaction takes as it moves through the pipeline.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::AggregatorError;

/// Storage-assigned identifier of a persisted transaction
pub type RecordId = u64;

/// Channel a transaction arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Electronic funds transfer
    Eft,
    /// Fee charged by the bank
    BankFee,
    /// Recurring debit order
    DebitOrder,
    /// Card purchase
    Card,
}

impl SourceType {
    /// All source types in declaration order
    pub const ALL: [SourceType; 4] = [
        SourceType::Eft,
        SourceType::BankFee,
        SourceType::DebitOrder,
        SourceType::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Eft => "EFT",
            SourceType::BankFee => "BANK_FEE",
            SourceType::DebitOrder => "DEBIT_ORDER",
            SourceType::Card => "CARD",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = AggregatorError;

    /// Parse a source type case-insensitively; `-` and `_` are interchangeable
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        SourceType::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| AggregatorError::invalid_source_type(s, None))
    }
}

/// Top-level classification of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Income,
    Expenses,
    BankFees,
    Shopping,
    FoodDrink,
    Transport,
    Entertainment,
    Utilities,
    Insurance,
    Uncategorized,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Income => "INCOME",
            Category::Expenses => "EXPENSES",
            Category::BankFees => "BANK_FEES",
            Category::Shopping => "SHOPPING",
            Category::FoodDrink => "FOOD_DRINK",
            Category::Transport => "TRANSPORT",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Utilities => "UTILITIES",
            Category::Insurance => "INSURANCE",
            Category::Uncategorized => "UNCATEGORIZED",
        }
    }

    /// Whether `subcategory` may be paired with this category
    ///
    /// `Other` is valid everywhere. `Expenses` and `Uncategorized` carry no
    /// specific subcategories of their own.
    pub fn allows(&self, subcategory: Subcategory) -> bool {
        use Subcategory::*;

        if subcategory == Other {
            return true;
        }

        match self {
            Category::Income => matches!(subcategory, Salary | Refund),
            Category::BankFees => matches!(subcategory, ServiceFee | AtmFee),
            Category::Shopping => matches!(subcategory, Groceries | Clothing),
            Category::FoodDrink => matches!(subcategory, Dining | FastFood),
            Category::Transport => matches!(subcategory, Fuel | Rideshare),
            Category::Entertainment => matches!(subcategory, Subscription | Streaming),
            Category::Utilities => matches!(subcategory, Municipal | Electricity | Water),
            Category::Insurance => matches!(subcategory, Medical | Vehicle | Life),
            Category::Expenses | Category::Uncategorized => false,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-level classification, meaningful only together with a [`Category`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Subcategory {
    // Income
    Salary,
    Refund,

    // Bank fees
    ServiceFee,
    AtmFee,

    // Shopping
    Groceries,
    Clothing,

    // Food & drink
    Dining,
    FastFood,

    // Transport
    Fuel,
    Rideshare,

    // Entertainment
    Subscription,
    Streaming,

    // Utilities
    Municipal,
    Electricity,
    Water,

    // Insurance
    Medical,
    Vehicle,
    Life,

    Other,
}

impl Subcategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcategory::Salary => "SALARY",
            Subcategory::Refund => "REFUND",
            Subcategory::ServiceFee => "SERVICE_FEE",
            Subcategory::AtmFee => "ATM_FEE",
            Subcategory::Groceries => "GROCERIES",
            Subcategory::Clothing => "CLOTHING",
            Subcategory::Dining => "DINING",
            Subcategory::FastFood => "FAST_FOOD",
            Subcategory::Fuel => "FUEL",
            Subcategory::Rideshare => "RIDESHARE",
            Subcategory::Subscription => "SUBSCRIPTION",
            Subcategory::Streaming => "STREAMING",
            Subcategory::Municipal => "MUNICIPAL",
            Subcategory::Electricity => "ELECTRICITY",
            Subcategory::Water => "WATER",
            Subcategory::Medical => "MEDICAL",
            Subcategory::Vehicle => "VEHICLE",
            Subcategory::Life => "LIFE",
            Subcategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category and subcategory that are always set together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub subcategory: Subcategory,
}

impl Classification {
    pub const fn new(category: Category, subcategory: Subcategory) -> Self {
        Self {
            category,
            subcategory,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.subcategory)
    }
}

/// Transaction as delivered by an upstream source
///
/// Produced once by a source and consumed exactly once by the rule engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// External identifier, unique per record
    pub transaction_id: String,

    pub client_id: String,

    pub account_number: String,

    pub source_type: SourceType,

    /// Free-text description; may be empty
    pub description: String,

    /// Signed amount with two decimal places
    ///
    /// Positive amounts are credits, negative amounts are debits.
    pub amount: Decimal,

    pub transaction_date: NaiveDateTime,
}

/// Raw transaction plus the fields derived by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub transaction_id: String,
    pub client_id: String,
    pub account_number: String,
    pub source_type: SourceType,
    pub description: String,
    pub amount: Decimal,
    pub transaction_date: NaiveDateTime,

    /// Category and subcategory assigned by the first matching rule
    pub classification: Classification,

    /// Merchant derived from the description, absent when nothing remains
    /// after noise tokens are stripped
    pub merchant_name: Option<String>,
}

impl CategorizedTransaction {
    /// Build a categorized transaction, copying every raw field unchanged
    pub fn new(
        raw: RawTransaction,
        classification: Classification,
        merchant_name: Option<String>,
    ) -> Self {
        Self {
            transaction_id: raw.transaction_id,
            client_id: raw.client_id,
            account_number: raw.account_number,
            source_type: raw.source_type,
            description: raw.description,
            amount: raw.amount,
            transaction_date: raw.transaction_date,
            classification,
            merchant_name,
        }
    }

    pub fn category(&self) -> Category {
        self.classification.category
    }

    pub fn subcategory(&self) -> Subcategory {
        self.classification.subcategory
    }
}

/// Categorized transaction after it has been persisted
///
/// Identifier and timestamps are assigned by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: RecordId,
    pub transaction: CategorizedTransaction,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
