//! End-to-end integration tests
//!
//! These tests validate the complete aggregation run using predefined CSV
//! test fixtures. Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Categorizes and stores every valid row
//! 3. Writes the requested summary report
//! 4. Compares the report with expected_category.csv or expected_account.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Every source channel and rule family
//! - Malformed rows (bad amounts, dates, source types, missing fields)
//! - Sign fallback for channels without rules and amount precision
//! - Header-only input
//!
//! Each fixture is run with both strategies and both reports, since the
//! sync and queued runs must agree on every input without duplicate ids.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;
    use transaction_aggregator::cli::{ReportKind, StrategyType};
    use transaction_aggregator::strategy::create_strategy;

    fn expected_file(report: ReportKind) -> &'static str {
        match report {
            ReportKind::Category => "expected_category.csv",
            ReportKind::Account => "expected_account.csv",
        }
    }

    /// Run a test fixture by processing input.csv and comparing with the expected report
    ///
    /// # Arguments
    ///
    /// * `fixture_name` - Name of the fixture directory (e.g., "mixed_channels")
    /// * `strategy_type` - Processing strategy to use (Sync or Queued)
    /// * `report` - Summary report to compare
    ///
    /// # Panics
    ///
    /// Panics if fixture files cannot be read or the output doesn't match.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType, report: ReportKind) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/{}", fixture_dir, expected_file(report));

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );
        assert!(
            Path::new(&expected_path).exists(),
            "Expected file not found: {}",
            expected_path
        );

        let strategy = create_strategy(strategy_type, None);
        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        strategy
            .process(Path::new(&input_path), report, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to process transactions: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?}, report: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, report, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both strategies and both reports
    #[rstest]
    #[case("mixed_channels")]
    #[case("malformed_data")]
    #[case("sign_fallback")]
    #[case("empty_input")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Queued)] strategy: StrategyType,
        #[values(ReportKind::Category, ReportKind::Account)] report: ReportKind,
    ) {
        run_test_fixture(fixture, strategy, report);
    }

    #[rstest]
    #[case::mixed_channels("mixed_channels", 15, 15)]
    #[case::malformed_data("malformed_data", 3, 3)]
    #[case::empty_input("empty_input", 0, 0)]
    fn test_aggregation_result_counts(
        #[case] fixture: &str,
        #[case] expected_processed: u64,
        #[case] expected_read: u64,
        #[values(StrategyType::Sync, StrategyType::Queued)] strategy: StrategyType,
    ) {
        let input_path = format!("tests/fixtures/{}/input.csv", fixture);
        let mut output = Vec::new();

        let result = create_strategy(strategy, None)
            .process(Path::new(&input_path), ReportKind::Category, &mut output)
            .unwrap();

        assert_eq!(result.total_processed, expected_processed);
        assert_eq!(result.total_read(), expected_read);
        assert_eq!(
            result.message,
            format!("Successfully aggregated {} transactions", expected_processed)
        );
    }

    #[test]
    fn test_sync_rejects_duplicate_ids() {
        let mut output = Vec::new();

        let result = create_strategy(StrategyType::Sync, None).process(
            Path::new("tests/fixtures/duplicate_ids/input.csv"),
            ReportKind::Category,
            &mut output,
        );

        assert!(result.unwrap_err().contains("card-1"));
        assert!(output.is_empty());
    }

    #[test]
    fn test_queued_skips_duplicate_ids() {
        let mut output = Vec::new();

        let result = create_strategy(StrategyType::Queued, None)
            .process(
                Path::new("tests/fixtures/duplicate_ids/input.csv"),
                ReportKind::Account,
                &mut output,
            )
            .unwrap();

        assert_eq!(result.total_processed, 2);
        assert_eq!(result.total_read(), 3);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account_number,transaction_count,total_amount\nACC-1,2,-720.00\n"
        );
    }
}
