//! Sales Analysis Pipeline Library
//!
//! A single-pass batch pipeline over a static NYC property-sales table,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline runs four stages, each consuming the full output of its
//! predecessor:
//!
//! - **Cleaning**: fallible casts of loosely-typed fields, label
//!   normalization, and exclusion of rows without a positive sale price,
//!   unit count and gross square footage
//! - **Aggregation**: global and per-(neighborhood, building class) mean /
//!   sample standard deviation / count, with small segments left
//!   unmaterialized
//! - **Metrics**: per-row global and segment z-scores (global fallback for
//!   small or zero-variance segments) and per-unit price/area ratios
//! - **Reporting**: deterministic ordering, contract-format rendering, and
//!   narrative summaries (top neighborhoods, log-price distribution shape)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use brownstone_processing::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_infer_schema_length(Some(0)) // read every column as text
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("nyc_sales.csv".into()))?
//!     .finish()?;
//!
//! let run = Pipeline::builder()
//!     .config(
//!         PipelineConfig::builder()
//!             .output_dir("./outputs")
//!             .top_neighborhoods(10)
//!             .build()?,
//!     )
//!     .build()?
//!     .run(df)?;
//!
//! println!(
//!     "{} of {} rows kept, {} segments",
//!     run.summary.rows_kept, run.summary.rows_loaded, run.summary.qualifying_segments
//! );
//! ```
//!
//! # Error model
//!
//! Only whole-run conditions are errors ([`AnalysisError`]): unreadable or
//! empty sources and missing contract columns. A row that fails validation
//! is excluded and tallied; a statistic that is undefined (zero spread, one
//! row) is absent, never a sentinel zero.

pub mod cleaner;
pub mod config;
pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod stats;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::SalesCleaner;
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use enrich::{MetricCalculator, zscore};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use report::{ReportGenerator, format_currency, format_thousands, format_zscore};
pub use stats::{
    GlobalStats, SalesAggregator, SalesStats, SegmentKey, SegmentStats, StatsBasis,
    sample_skewness, sample_stddev,
};
pub use types::{
    AnalysisRun, CleaningOutcome, DropCounts, NeighborhoodCount, PriceDistribution, SaleDateRange,
    SalesReport, SalesReportSummary,
};
pub use utils::{
    clean_numeric_string, is_missing_marker, normalize_label, parse_numeric_string, parse_sale_date,
};
