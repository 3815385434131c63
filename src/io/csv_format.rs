//! CSV format handling for raw transactions and summary output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to raw transactions
//! - Category and account summary serialization
//!
//! All functions are pure (no I/O) for easy testing.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;

use crate::types::{
    AccountSummary, AggregatorError, CategorySummary, RawTransaction, SourceType, SummaryRecord,
};

/// Decimal places kept for every amount
pub const AMOUNT_SCALE: u32 = 2;

/// Column names of the transaction input format
pub const INPUT_HEADER: [&str; 7] = [
    "transaction_id",
    "client_id",
    "account_number",
    "source_type",
    "description",
    "amount",
    "transaction_date",
];

/// CSV record structure for deserialization
///
/// Every column is read as text so that a bad value is reported against
/// the transaction it belongs to instead of as an opaque serde error.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRecord {
    pub transaction_id: String,
    pub client_id: String,
    pub account_number: String,
    pub source_type: String,
    #[serde(default)]
    pub description: String,
    pub amount: Option<String>,
    pub transaction_date: String,
}

/// Convert a CsvRecord to a RawTransaction
///
/// This function:
/// - Rejects empty identifiers
/// - Parses the source type case-insensitively
/// - Parses the amount into a Decimal rounded to two places
/// - Parses the ISO-8601 local date-time
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// * `Ok(RawTransaction)` - Successfully converted record
/// * `Err(AggregatorError)` - The first field that failed validation
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<RawTransaction, AggregatorError> {
    let transaction_id = required("transaction_id", csv_record.transaction_id)?;
    let client_id = required("client_id", csv_record.client_id)?;
    let account_number = required("account_number", csv_record.account_number)?;

    let source_type = SourceType::from_str(&csv_record.source_type).map_err(|_| {
        AggregatorError::invalid_source_type(&csv_record.source_type, Some(&transaction_id))
    })?;

    let amount = match csv_record.amount {
        Some(amount) if !amount.trim().is_empty() => parse_amount(amount.trim())
            .ok_or_else(|| AggregatorError::invalid_amount(&amount, &transaction_id))?,
        _ => return Err(AggregatorError::missing_amount(&transaction_id)),
    };

    let transaction_date = csv_record
        .transaction_date
        .trim()
        .parse::<NaiveDateTime>()
        .map_err(|_| {
            AggregatorError::invalid_timestamp(&csv_record.transaction_date, &transaction_id)
        })?;

    Ok(RawTransaction {
        transaction_id,
        client_id,
        account_number,
        source_type,
        description: csv_record.description.trim().to_string(),
        amount,
        transaction_date,
    })
}

fn required(field: &str, value: String) -> Result<String, AggregatorError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AggregatorError::missing_field(field))
    } else {
        Ok(value.to_string())
    }
}

fn parse_amount(amount: &str) -> Option<Decimal> {
    let mut decimal = Decimal::from_str(amount).ok()?;
    decimal.rescale(AMOUNT_SCALE);
    Some(decimal)
}

/// Write a category summary in CSV format
///
/// Columns: category, transaction_count, total_amount. Rows are written in
/// the order given.
///
/// # Arguments
///
/// * `summary` - Category totals, already sorted
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_category_summary_csv(
    summary: &[CategorySummary],
    output: &mut dyn Write,
) -> Result<(), String> {
    write_summary_csv("category", summary, output)
}

/// Write an account summary in CSV format
///
/// Columns: account_number, transaction_count, total_amount.
pub fn write_account_summary_csv(
    summary: &[AccountSummary],
    output: &mut dyn Write,
) -> Result<(), String> {
    write_summary_csv("account_number", summary, output)
}

fn write_summary_csv<K: Display>(
    key_column: &str,
    summary: &[SummaryRecord<K>],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([key_column, "transaction_count", "total_amount"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for record in summary {
        writer
            .write_record(&[
                record.key.to_string(),
                record.transaction_count.to_string(),
                format!("{:.2}", record.total_amount),
            ])
            .map_err(|e| format!("Failed to write summary record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn record() -> CsvRecord {
        CsvRecord {
            transaction_id: "card-1".to_string(),
            client_id: "CLIENT-001".to_string(),
            account_number: "ACC-12345-001".to_string(),
            source_type: "CARD".to_string(),
            description: "Woolworths Sandton City".to_string(),
            amount: Some("-1256.80".to_string()),
            transaction_date: "2024-03-01T10:15:00".to_string(),
        }
    }

    #[test]
    fn test_convert_csv_record_valid() {
        let raw = convert_csv_record(record()).unwrap();

        assert_eq!(raw.transaction_id, "card-1");
        assert_eq!(raw.client_id, "CLIENT-001");
        assert_eq!(raw.account_number, "ACC-12345-001");
        assert_eq!(raw.source_type, SourceType::Card);
        assert_eq!(raw.description, "Woolworths Sandton City");
        assert_eq!(raw.amount, Decimal::new(-125680, 2));
        assert_eq!(
            raw.transaction_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap()
        );
    }

    #[rstest]
    #[case("EFT", SourceType::Eft)]
    #[case("bank_fee", SourceType::BankFee)]
    #[case("debit_order", SourceType::DebitOrder)]
    #[case("Card", SourceType::Card)]
    fn test_convert_csv_record_source_types(#[case] source: &str, #[case] expected: SourceType) {
        let csv_record = CsvRecord {
            source_type: source.to_string(),
            ..record()
        };

        assert_eq!(convert_csv_record(csv_record).unwrap().source_type, expected);
    }

    #[rstest]
    #[case("  100  ", Decimal::new(10000, 2))]
    #[case("-8.5", Decimal::new(-850, 2))]
    #[case("45000.00", Decimal::new(4500000, 2))]
    #[case("19.999", Decimal::new(2000, 2))] // rounded to two places
    fn test_convert_csv_record_amount_parsing(#[case] amount: &str, #[case] expected: Decimal) {
        let csv_record = CsvRecord {
            amount: Some(amount.to_string()),
            ..record()
        };

        let raw = convert_csv_record(csv_record).unwrap();
        assert_eq!(raw.amount, expected);
        assert_eq!(raw.amount.scale(), AMOUNT_SCALE);
    }

    #[test]
    fn test_convert_csv_record_fractional_seconds() {
        let csv_record = CsvRecord {
            transaction_date: "2024-03-01T10:15:00.250".to_string(),
            ..record()
        };

        let raw = convert_csv_record(csv_record).unwrap();
        assert_eq!(raw.transaction_date.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_convert_csv_record_allows_empty_description() {
        let csv_record = CsvRecord {
            description: "   ".to_string(),
            ..record()
        };

        assert_eq!(convert_csv_record(csv_record).unwrap().description, "");
    }

    #[rstest]
    #[case::missing_id(
        CsvRecord { transaction_id: " ".to_string(), ..record() },
        AggregatorError::missing_field("transaction_id")
    )]
    #[case::missing_client(
        CsvRecord { client_id: String::new(), ..record() },
        AggregatorError::missing_field("client_id")
    )]
    #[case::missing_account(
        CsvRecord { account_number: String::new(), ..record() },
        AggregatorError::missing_field("account_number")
    )]
    #[case::invalid_source_type(
        CsvRecord { source_type: "WIRE".to_string(), ..record() },
        AggregatorError::invalid_source_type("WIRE", Some("card-1"))
    )]
    #[case::missing_amount(
        CsvRecord { amount: None, ..record() },
        AggregatorError::missing_amount("card-1")
    )]
    #[case::blank_amount(
        CsvRecord { amount: Some("  ".to_string()), ..record() },
        AggregatorError::missing_amount("card-1")
    )]
    #[case::invalid_amount(
        CsvRecord { amount: Some("R100".to_string()), ..record() },
        AggregatorError::invalid_amount("R100", "card-1")
    )]
    #[case::invalid_date(
        CsvRecord { transaction_date: "01/03/2024".to_string(), ..record() },
        AggregatorError::invalid_timestamp("01/03/2024", "card-1")
    )]
    #[case::date_without_time(
        CsvRecord { transaction_date: "2024-03-01".to_string(), ..record() },
        AggregatorError::invalid_timestamp("2024-03-01", "card-1")
    )]
    fn test_convert_csv_record_errors(#[case] csv_record: CsvRecord, #[case] expected: AggregatorError) {
        assert_eq!(convert_csv_record(csv_record), Err(expected));
    }

    #[rstest]
    #[case::empty(vec![], "category,transaction_count,total_amount\n")]
    #[case::rows_in_given_order(
        vec![
            SummaryRecord { key: Category::Income, transaction_count: 2, total_amount: Decimal::new(4512580, 2) },
            SummaryRecord { key: Category::BankFees, transaction_count: 1, total_amount: Decimal::new(-850, 2) },
        ],
        "category,transaction_count,total_amount\nINCOME,2,45125.80\nBANK_FEES,1,-8.50\n"
    )]
    #[case::pads_to_two_places(
        vec![SummaryRecord { key: Category::FoodDrink, transaction_count: 1, total_amount: Decimal::new(-385, 0) }],
        "category,transaction_count,total_amount\nFOOD_DRINK,1,-385.00\n"
    )]
    fn test_write_category_summary_csv(
        #[case] summary: Vec<CategorySummary>,
        #[case] expected_output: &str,
    ) {
        let mut output = Vec::new();
        write_category_summary_csv(&summary, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }

    #[test]
    fn test_write_account_summary_csv() {
        let summary = vec![
            SummaryRecord {
                key: "ACC-12345-001".to_string(),
                transaction_count: 3,
                total_amount: Decimal::new(4374320, 2),
            },
            SummaryRecord {
                key: "ACC-12345-002".to_string(),
                transaction_count: 1,
                total_amount: Decimal::ZERO,
            },
        ];

        let mut output = Vec::new();
        write_account_summary_csv(&summary, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account_number,transaction_count,total_amount\nACC-12345-001,3,43743.20\nACC-12345-002,1,0.00\n"
        );
    }
}
