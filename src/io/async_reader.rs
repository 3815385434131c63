//! Asynchronous CSV reader with batch interface
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of RawTransactions
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::RawTransaction;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Reads raw transactions in batches. Rejected rows are logged with their
/// line number and skipped.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
    rejected: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            rejected: 0,
        }
    }

    /// Read up to `batch_size` valid transactions
    ///
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<RawTransaction> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let Some(next) = records.next().await else {
                break;
            };
            self.line_num += 1;

            match next {
                Ok(csv_record) => match convert_csv_record(csv_record) {
                    Ok(raw) => batch.push(raw),
                    Err(e) => {
                        self.rejected += 1;
                        warn!(line = self.line_num, error = %e, "Rejected transaction row");
                    }
                },
                Err(e) => {
                    self.rejected += 1;
                    warn!(line = self.line_num, error = %e, "CSV parse error");
                }
            }
        }

        batch
    }

    /// Rows rejected so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceType;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str =
        "transaction_id,client_id,account_number,source_type,description,amount,transaction_date\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        let content = format!("{}{}", HEADER, rows);
        AsyncReader::new(Cursor::new(content.into_bytes()))
    }

    fn row(id: &str, amount: &str) -> String {
        format!("{},CLIENT-001,ACC-1,CARD,Checkers,{},2024-03-01T10:00:00\n", id, amount)
    }

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let rows: String = (1..=5).map(|i| row(&i.to_string(), "-10.00")).collect();
        let mut async_reader = reader(&rows);

        let batch1 = async_reader.read_batch(2).await;
        assert_eq!(batch1.len(), 2);
        assert_eq!(batch1[0].transaction_id, "1");
        assert_eq!(batch1[1].transaction_id, "2");

        let batch2 = async_reader.read_batch(2).await;
        assert_eq!(batch2.len(), 2);
        assert_eq!(batch2[0].transaction_id, "3");

        let batch3 = async_reader.read_batch(2).await;
        assert_eq!(batch3.len(), 1);
        assert_eq!(batch3[0].transaction_id, "5");

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");
        assert!(async_reader.read_batch(10).await.is_empty());
        assert_eq!(async_reader.rejected(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let rows = format!("{}{}{}", row("1", "abc"), row("2", "-5.50"), row("3", ""));
        let mut async_reader = reader(&rows);

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].transaction_id, "2");
        assert_eq!(batch[0].amount, Decimal::new(-550, 2));
        assert_eq!(batch[0].source_type, SourceType::Card);
        assert_eq!(async_reader.rejected(), 2);
    }
}
