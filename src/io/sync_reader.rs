//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over raw transactions from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<RawTransaction, String>` for each CSV row:
//!
//! ```no_run
//! use transaction_aggregator::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("transactions.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(raw) => println!("Read transaction: {}", raw.transaction_id),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Row errors are yielded as Err variants carrying the line number
//!   (counting the header as line 1), and iteration continues

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::RawTransaction;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Reads one row at a time; memory use does not grow with file size.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a CSV file for streaming iteration
    ///
    /// Fields are trimmed and rows with a missing trailing column are
    /// accepted, so an absent amount is reported as a missing amount rather
    /// than a CSV shape error.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if file opened successfully
    /// * `Err(String)` if file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<RawTransaction, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let next = deserializer.next()?;
        self.line_num += 1;

        Some(match next {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", self.line_num, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", self.line_num, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "transaction_id,client_id,account_number,source_type,description,amount,transaction_date\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .expect("Failed to write to temp file");
        file.write_all(rows.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_iterates_valid_records() {
        let file = create_temp_csv(
            "card-1,CLIENT-001,ACC-1,CARD,Woolworths Sandton City,-1256.80,2024-03-01T10:15:00\n\
             eft-1,CLIENT-001,ACC-1,EFT,Refund from Woolworths,125.80,2024-03-02T08:00:00\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.transaction_id, "card-1");
        assert_eq!(first.source_type, SourceType::Card);
        assert_eq!(first.amount, Decimal::new(-125680, 2));
        let second = records[1].as_ref().unwrap();
        assert_eq!(second.source_type, SourceType::Eft);
    }

    #[test]
    fn test_sync_reader_quoted_description_with_comma() {
        let file = create_temp_csv(
            "do-1,CLIENT-002,ACC-2,DEBIT_ORDER,\"Medical Aid, Discovery Health\",-3500.00,2024-03-01T00:00:00\n",
        );

        let records: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(records[0].description, "Medical Aid, Discovery Health");
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv(
            "a,CLIENT-001,ACC-1,CARD,Spar,-10.00,2024-03-01T10:00:00\n\
             b,CLIENT-001,ACC-1,WIRE,Spar,-10.00,2024-03-01T10:00:00\n\
             c,CLIENT-001,ACC-1,CARD,Spar,-10.00,2024-03-01T10:00:00\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[2].is_ok());

        let error = records[1].as_ref().unwrap_err();
        assert!(error.contains("Line 3")); // Line 3 because of header
        assert!(error.contains("Invalid source type 'WIRE'"));
    }

    #[test]
    fn test_sync_reader_missing_amount_column() {
        let file = create_temp_csv("a,CLIENT-001,ACC-1,CARD,Spar\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 1);
        let error = records[0].as_ref().unwrap_err();
        assert!(error.contains("Line 2"));
    }

    #[test]
    fn test_sync_reader_handles_whitespace() {
        let file = create_temp_csv(
            "  a  ,  CLIENT-001  ,  ACC-1  ,  card  ,  Spar  ,  -10.00  ,  2024-03-01T10:00:00  \n",
        );

        let records: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_id, "a");
        assert_eq!(records[0].description, "Spar");
        assert_eq!(records[0].amount, Decimal::new(-1000, 2));
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("");
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
