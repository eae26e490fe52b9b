//! Custom error types for the sales analysis pipeline.
//!
//! Only whole-run failures are errors here. Per-row validation failures are
//! tallied as drop counts by the cleaner, and undefined statistics become
//! absent values downstream; neither ever surfaces as an `AnalysisError`.
//!
//! Errors are serializable so they can be embedded in the JSON report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A source column required by the table contract is missing.
    #[error("Column '{0}' not found in source table")]
    ColumnNotFound(String),

    /// The source produced no usable rows.
    #[error("Source table is empty or contains no valid rows")]
    EmptySource,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data cleaning failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// Aggregation failed.
    #[error("Failed to aggregate sales statistics: {0}")]
    AggregationFailed(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable code for report embedding and exit-status mapping.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptySource => "EMPTY_SOURCE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::AggregationFailed(_) => "AGGREGATION_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(AnalysisError::EmptySource.error_code(), "EMPTY_SOURCE");
        assert_eq!(
            AnalysisError::ColumnNotFound("SALE_PRICE".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = AnalysisError::ColumnNotFound("TOTAL_UNITS".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("TOTAL_UNITS"));
    }

    #[test]
    fn test_with_context() {
        let error = AnalysisError::EmptySource.with_context("During aggregation");
        assert!(error.to_string().contains("During aggregation"));
        assert_eq!(error.error_code(), "EMPTY_SOURCE"); // Preserves original code
    }
}
