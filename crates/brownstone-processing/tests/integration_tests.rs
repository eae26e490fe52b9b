//! Integration tests for the sales analysis pipeline.
//!
//! These tests verify end-to-end behavior of the pipeline using CSV
//! fixtures shaped like the NYC sales extract.

use brownstone_processing::schema::{
    NEIGHBORHOOD, OUTPUT_COLUMNS, PRICE_PER_UNIT, SALE_PRICE_ZSCORE,
    SALE_PRICE_ZSCORE_NEIGHBORHOOD, SQUARE_FT_PER_UNIT,
};
use brownstone_processing::{
    AnalysisError, AnalysisRun, Pipeline, PipelineConfig, SalesAggregator, SalesCleaner,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    let path = fixtures_path().join(filename);
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0)) // every column as text
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn run_pipeline(filename: &str) -> AnalysisRun {
    let df = load_csv(filename);
    Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .run(df)
        .unwrap()
}

/// Row indices of the presentation frame belonging to a neighborhood.
fn rows_for_neighborhood(frame: &DataFrame, neighborhood: &str) -> Vec<usize> {
    let series = frame
        .column(NEIGHBORHOOD)
        .unwrap()
        .as_materialized_series()
        .clone();
    let values = series.str().unwrap();
    (0..frame.height())
        .filter(|&i| values.get(i) == Some(neighborhood))
        .collect()
}

fn string_at(frame: &DataFrame, column: &str, row: usize) -> Option<String> {
    let series = frame
        .column(column)
        .unwrap()
        .as_materialized_series()
        .clone();
    series.str().unwrap().get(row).map(|s| s.to_string())
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_subset() {
    let run = run_pipeline("nyc_sales_subset.csv");

    // 18 source rows, 5 fail the required-field check
    assert_eq!(run.summary.rows_loaded, 18);
    assert_eq!(run.summary.rows_kept, 13);
    assert_eq!(run.summary.rows_dropped, 5);
    assert_eq!(run.presentation.height(), 13);
}

#[test]
fn test_output_column_contract() {
    let run = run_pipeline("nyc_sales_subset.csv");

    let names: Vec<&str> = run
        .presentation
        .get_column_names()
        .iter()
        .map(|s| s.as_str())
        .collect();
    assert_eq!(names, OUTPUT_COLUMNS.to_vec());
}

#[test]
fn test_presentation_ordering() {
    let run = run_pipeline("nyc_sales_subset.csv");
    let frame = &run.presentation;

    let series = frame
        .column(NEIGHBORHOOD)
        .unwrap()
        .as_materialized_series()
        .clone();
    let values = series.str().unwrap();

    // Primary key is the case-normalized neighborhood, ascending
    let mut previous = String::new();
    for i in 0..frame.height() {
        let current = values.get(i).unwrap().to_string();
        assert!(current >= previous, "neighborhoods out of order at row {i}");
        previous = current;
    }
    assert_eq!(values.get(0), Some("HARLEM"));
}

#[test]
fn test_drop_accounting() {
    let df = load_csv("nyc_sales_subset.csv");
    let outcome = SalesCleaner.clean(df).unwrap();

    assert_eq!(outcome.rows_dropped, 5);
    assert_eq!(outcome.drops.invalid_sale_price, 3);
    assert_eq!(outcome.drops.invalid_total_units, 1);
    assert_eq!(outcome.drops.invalid_gross_square_feet, 1);

    // Dropping rows with an invalid sale price reduces the output by exactly
    // the number of such rows; no other rows are affected
    assert_eq!(
        outcome.frame.height(),
        outcome.rows_in - outcome.rows_dropped
    );
}

// ============================================================================
// End-to-End Example: the SOHO/A1 Fallback
// ============================================================================

#[test]
fn test_soho_small_segment_falls_back_to_global() {
    let run = run_pipeline("nyc_sales_subset.csv");
    let frame = &run.presentation;

    let soho_rows = rows_for_neighborhood(frame, "SOHO");
    assert_eq!(soho_rows.len(), 2);

    // The SOHO/A1 segment holds 2 rows (<= 5), so both rows carry the
    // global z-score in the neighborhood column
    for &row in &soho_rows {
        let global = string_at(frame, SALE_PRICE_ZSCORE, row);
        let segment = string_at(frame, SALE_PRICE_ZSCORE_NEIGHBORHOOD, row);
        assert!(global.is_some());
        assert_eq!(global, segment);
    }

    // Rows are ordered by address: 100 Grand St ($1M) then 102 Grand St ($3M)
    assert_eq!(
        string_at(frame, SQUARE_FT_PER_UNIT, soho_rows[0]).as_deref(),
        Some("1,000.00")
    );
    assert_eq!(
        string_at(frame, SQUARE_FT_PER_UNIT, soho_rows[1]).as_deref(),
        Some("1,000.00")
    );
    assert_eq!(
        string_at(frame, PRICE_PER_UNIT, soho_rows[0]).as_deref(),
        Some("$500,000.00")
    );
    assert_eq!(
        string_at(frame, PRICE_PER_UNIT, soho_rows[1]).as_deref(),
        Some("$1,500,000.00")
    );
}

#[test]
fn test_qualifying_segment_uses_own_statistics() {
    let run = run_pipeline("nyc_sales_subset.csv");
    let frame = &run.presentation;

    // UPPER EAST SIDE / 07 RENTALS holds 8 rows (> 5), so its z-scores come
    // from segment statistics and differ from the global ones
    assert_eq!(run.summary.qualifying_segments, 1);

    let ues_rows = rows_for_neighborhood(frame, "UPPER EAST SIDE");
    assert_eq!(ues_rows.len(), 8);

    let differing = ues_rows
        .iter()
        .filter(|&&row| {
            string_at(frame, SALE_PRICE_ZSCORE, row)
                != string_at(frame, SALE_PRICE_ZSCORE_NEIGHBORHOOD, row)
        })
        .count();
    assert!(differing > 0, "segment z-scores should differ from global");
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_aggregation_is_order_invariant() {
    let df = load_csv("nyc_sales_subset.csv");
    let cleaned = SalesCleaner.clean(df).unwrap().frame;
    let reversed = cleaned.reverse();

    let a = SalesAggregator.aggregate(&cleaned, 5).unwrap();
    let b = SalesAggregator.aggregate(&reversed, 5).unwrap();

    assert!((a.global.mean - b.global.mean).abs() < 1e-6);
    assert!((a.global.stddev.unwrap() - b.global.stddev.unwrap()).abs() < 1e-6);
    assert_eq!(a.segments.len(), b.segments.len());
    for (key, stats) in &a.segments {
        let other = &b.segments[key];
        assert!((stats.mean - other.mean).abs() < 1e-6);
        assert_eq!(stats.count, other.count);
    }
}

#[test]
fn test_shuffled_input_same_presentation() {
    let df = load_csv("nyc_sales_subset.csv");
    let reversed = df.reverse();

    let config = || {
        PipelineConfig::builder()
            .save_to_disk(false)
            .build()
            .unwrap()
    };

    let a = Pipeline::builder()
        .config(config())
        .build()
        .unwrap()
        .run(df)
        .unwrap();
    let b = Pipeline::builder()
        .config(config())
        .build()
        .unwrap()
        .run(reversed)
        .unwrap();

    assert_eq!(a.presentation.height(), b.presentation.height());
    for column in [NEIGHBORHOOD, SALE_PRICE_ZSCORE, PRICE_PER_UNIT] {
        for row in 0..a.presentation.height() {
            assert_eq!(
                string_at(&a.presentation, column, row),
                string_at(&b.presentation, column, row),
                "mismatch in {column} at row {row}"
            );
        }
    }
}

// ============================================================================
// Summary Content
// ============================================================================

#[test]
fn test_summary_top_neighborhoods_and_dates() {
    let run = run_pipeline("nyc_sales_subset.csv");
    let summary = &run.summary;

    assert_eq!(summary.top_neighborhoods.len(), 3);
    assert_eq!(summary.top_neighborhoods[0].neighborhood, "UPPER EAST SIDE");
    assert_eq!(summary.top_neighborhoods[0].transactions, 8);
    assert_eq!(summary.top_neighborhoods[1].neighborhood, "HARLEM");
    assert_eq!(summary.top_neighborhoods[2].neighborhood, "SOHO");

    let range = summary.sale_date_range.as_ref().unwrap();
    assert_eq!(range.earliest, "2016-01-15");
    assert_eq!(range.latest, "2017-06-30");

    assert!(summary.global_stddev_sale_price.unwrap() > 0.0);
    assert!(summary.log_sale_price.stddev.is_some());
}

// ============================================================================
// Whole-Run Failures
// ============================================================================

#[test]
fn test_empty_source_is_fatal() {
    let df = load_csv("headers_only.csv");
    let result = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .run(df);

    assert!(matches!(result, Err(AnalysisError::EmptySource)));
}

#[test]
fn test_all_invalid_rows_is_fatal() {
    let df = load_csv("all_invalid.csv");
    let result = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .run(df);

    assert!(matches!(result, Err(AnalysisError::EmptySource)));
}

// ============================================================================
// Output Files
// ============================================================================

#[test]
fn test_output_files_written() {
    let output_dir = std::env::temp_dir().join("brownstone_processing_test_outputs");
    let _ = std::fs::remove_dir_all(&output_dir);

    let df = load_csv("nyc_sales_subset.csv");
    let run = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .output_dir(&output_dir)
                .output_name("subset_enriched")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
        .run(df)
        .unwrap();

    let output_path = run.output_path.as_ref().unwrap();
    assert!(output_path.exists());

    let content = std::fs::read_to_string(output_path).unwrap();
    let header = content.lines().next().unwrap();
    assert!(header.contains("formatted_sale_price"));
    assert!(header.contains("sale_price_zscore_neighborhood"));
    assert_eq!(content.lines().count(), 14); // header + 13 rows

    let report_path = run.report_path.as_ref().unwrap();
    assert!(report_path.exists());
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["rows_kept"], 13);

    std::fs::remove_dir_all(&output_dir).unwrap();
}
