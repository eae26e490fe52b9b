use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-field tallies of rows rejected by the cleaner.
///
/// A row missing several required fields is counted in each matching tally,
/// so the tallies may sum to more than the total number of dropped rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    /// Rows without a positive, numeric SALE_PRICE.
    pub invalid_sale_price: usize,
    /// Rows without a positive, integer TOTAL_UNITS.
    pub invalid_total_units: usize,
    /// Rows without a positive, numeric GROSS_SQUARE_FEET.
    pub invalid_gross_square_feet: usize,
}

impl DropCounts {
    /// True when no row failed any required-field check.
    pub fn is_empty(&self) -> bool {
        self.invalid_sale_price == 0
            && self.invalid_total_units == 0
            && self.invalid_gross_square_feet == 0
    }
}

/// Output of the cleaning stage.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    /// The cleaned frame: typed columns, required fields positive and non-null.
    pub frame: DataFrame,
    /// Rows in the source frame before cleaning.
    pub rows_in: usize,
    /// Rows excluded by the required-field check.
    pub rows_dropped: usize,
    /// Per-field breakdown of the exclusions.
    pub drops: DropCounts,
    /// Human-readable record of what the cleaner did.
    pub actions: Vec<String>,
}

/// One neighborhood ranked by transaction count in the report summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodCount {
    pub neighborhood: String,
    pub transactions: usize,
}

/// Distribution characteristics of a (transformed) price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDistribution {
    pub mean: f64,
    /// Sample standard deviation; absent for fewer than two values.
    pub stddev: Option<f64>,
    /// Sample skewness; absent when the spread is absent or zero.
    pub skewness: Option<f64>,
    /// "normal" for |skewness| < 1, "skewed" otherwise, "undetermined" when
    /// skewness is absent.
    pub shape: String,
}

/// Earliest and latest parsed sale dates, ISO-formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDateRange {
    pub earliest: String,
    pub latest: String,
}

/// Narrative-level summary statistics derived from one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReportSummary {
    /// Rows in the source before cleaning.
    pub rows_loaded: usize,
    /// Rows surviving the required-field check.
    pub rows_kept: usize,
    /// Rows excluded by the cleaner.
    pub rows_dropped: usize,
    /// Per-field breakdown of the exclusions.
    pub drops: DropCounts,

    /// Mean sale price over all cleaned rows.
    pub global_mean_sale_price: f64,
    /// Sample standard deviation of sale price; absent for n <= 1.
    pub global_stddev_sale_price: Option<f64>,
    /// Number of (neighborhood, building class) segments large enough to
    /// carry their own statistics.
    pub qualifying_segments: usize,

    /// Neighborhoods ranked by transaction count, descending.
    pub top_neighborhoods: Vec<NeighborhoodCount>,
    /// Distribution of the natural log of sale price.
    pub log_sale_price: PriceDistribution,
    /// Range of parsed sale dates, when any parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_date_range: Option<SaleDateRange>,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// The presentation-ready row set, ordered and formatted.
    pub presentation: DataFrame,
    /// Summary statistics for the narrative.
    pub summary: SalesReportSummary,
    /// What the cleaner did, in order.
    pub cleaning_actions: Vec<String>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Where the row set was written, if saving was enabled.
    pub output_path: Option<PathBuf>,
    /// Where the JSON report was written, if enabled.
    pub report_path: Option<PathBuf>,
}

/// The full JSON report: run metadata plus the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    /// Timestamp when the report was generated.
    pub generated_at: String,
    /// Path to the input file.
    pub input_file: String,
    /// Path to the written row set, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Summary statistics.
    pub summary: SalesReportSummary,
    /// Cleaning actions performed.
    pub cleaning_actions: Vec<String>,
}
