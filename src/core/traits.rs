//! Core traits for transaction persistence
//!
//! This module defines the storage seam the pipeline writes through, so the
//! in-memory repository used by the CLI and tests can be swapped for any
//! other thread-safe backend.

use chrono::NaiveDateTime;

use crate::types::{
    AggregatorError, CategorizedTransaction, Category, RecordId, SourceType, StoredTransaction,
};

/// Trait for persisting and querying categorized transactions
///
/// Implementations must be safe to call from many consumer workers at once.
/// All listings are ordered by record id.
pub trait TransactionRepository: Send + Sync {
    /// Persist a categorized transaction
    ///
    /// Assigns the record id and timestamps.
    ///
    /// # Errors
    ///
    /// * `DuplicateTransaction` - a record with the same external id is already stored
    /// * `StorageUnavailable` - the backend could not complete the write
    fn save(&self, transaction: CategorizedTransaction) -> Result<StoredTransaction, AggregatorError>;

    /// Persist several transactions, stopping at the first error
    fn save_all(
        &self,
        transactions: Vec<CategorizedTransaction>,
    ) -> Result<Vec<StoredTransaction>, AggregatorError> {
        transactions
            .into_iter()
            .map(|transaction| self.save(transaction))
            .collect()
    }

    /// Look up a stored transaction by record id
    fn find_by_id(&self, id: RecordId) -> Option<StoredTransaction>;

    /// Every stored transaction
    fn find_all(&self) -> Vec<StoredTransaction>;

    /// Stored transactions matching every set field of `filter`
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if the filter's start date is after its end date.
    fn find_by_filters(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<StoredTransaction>, AggregatorError> {
        filter.validate()?;

        Ok(self
            .find_all()
            .into_iter()
            .filter(|stored| filter.matches(stored))
            .collect())
    }

    /// Number of stored transactions
    fn count(&self) -> usize;
}

/// Optional criteria for listing stored transactions
///
/// Unset fields match everything; set fields combine with AND. Date bounds
/// are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub category: Option<Category>,
    pub source_type: Option<SourceType>,
    pub account_number: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = Some(source_type);
        self
    }

    pub fn account_number(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = Some(account_number.into());
        self
    }

    pub fn start_date(mut self, start_date: NaiveDateTime) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn end_date(mut self, end_date: NaiveDateTime) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Reject a date range whose start is after its end
    pub fn validate(&self) -> Result<(), AggregatorError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => {
                Err(AggregatorError::InvalidDateRange { start, end })
            }
            _ => Ok(()),
        }
    }

    /// Whether a stored transaction satisfies every set criterion
    pub fn matches(&self, stored: &StoredTransaction) -> bool {
        let transaction = &stored.transaction;

        self.category
            .map_or(true, |category| transaction.category() == category)
            && self
                .source_type
                .map_or(true, |source_type| transaction.source_type == source_type)
            && self
                .account_number
                .as_deref()
                .map_or(true, |account| transaction.account_number == account)
            && self
                .start_date
                .map_or(true, |start| transaction.transaction_date >= start)
            && self
                .end_date
                .map_or(true, |end| transaction.transaction_date <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, Subcategory};
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn date(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn stored() -> StoredTransaction {
        StoredTransaction {
            id: 1,
            transaction: CategorizedTransaction {
                transaction_id: "card-1".to_string(),
                client_id: "CLIENT-001".to_string(),
                account_number: "ACC-0000000001".to_string(),
                source_type: SourceType::Card,
                description: "Woolworths Sandton City".to_string(),
                amount: Decimal::new(-125680, 2),
                transaction_date: date(10),
                classification: Classification::new(Category::Shopping, Subcategory::Groceries),
                merchant_name: Some("Woolworths Sandton City".to_string()),
            },
            created_at: date(10),
            updated_at: date(10),
        }
    }

    #[rstest]
    #[case::empty(TransactionFilter::new(), true)]
    #[case::category(TransactionFilter::new().category(Category::Shopping), true)]
    #[case::other_category(TransactionFilter::new().category(Category::Income), false)]
    #[case::source_type(TransactionFilter::new().source_type(SourceType::Card), true)]
    #[case::other_source_type(TransactionFilter::new().source_type(SourceType::Eft), false)]
    #[case::account(TransactionFilter::new().account_number("ACC-0000000001"), true)]
    #[case::other_account(TransactionFilter::new().account_number("ACC-0000000002"), false)]
    #[case::inclusive_start(TransactionFilter::new().start_date(date(10)), true)]
    #[case::inclusive_end(TransactionFilter::new().end_date(date(10)), true)]
    #[case::before_range(TransactionFilter::new().start_date(date(11)), false)]
    #[case::after_range(TransactionFilter::new().end_date(date(9)), false)]
    #[case::all_match(
        TransactionFilter::new()
            .category(Category::Shopping)
            .source_type(SourceType::Card)
            .start_date(date(1))
            .end_date(date(31)),
        true
    )]
    #[case::one_mismatch(
        TransactionFilter::new()
            .category(Category::Shopping)
            .source_type(SourceType::DebitOrder),
        false
    )]
    fn test_filter_matches(#[case] filter: TransactionFilter, #[case] expected: bool) {
        assert_eq!(filter.matches(&stored()), expected);
    }

    #[rstest]
    #[case::open(None, None, true)]
    #[case::start_only(Some(5), None, true)]
    #[case::same_day(Some(5), Some(5), true)]
    #[case::ordered(Some(1), Some(5), true)]
    #[case::reversed(Some(5), Some(1), false)]
    fn test_filter_validate(
        #[case] start: Option<u32>,
        #[case] end: Option<u32>,
        #[case] valid: bool,
    ) {
        let filter = TransactionFilter {
            start_date: start.map(date),
            end_date: end.map(date),
            ..TransactionFilter::default()
        };

        assert_eq!(filter.validate().is_ok(), valid);
    }
}
