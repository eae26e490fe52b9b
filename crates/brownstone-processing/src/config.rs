//! Configuration types for the sales analysis pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the analysis pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use brownstone_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .segment_min_count(5)
///     .top_neighborhoods(10)
///     .save_to_disk(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Segments must hold strictly more rows than this to get their own
    /// statistics; smaller segments fall back to the global mean/stddev.
    /// Default: 5
    pub segment_min_count: usize,

    /// Number of neighborhoods (by transaction count) listed in the report
    /// summary.
    /// Default: 10
    pub top_neighborhoods: usize,

    /// Output directory for the enriched row set and reports.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Custom output file name (without extension).
    /// If None, a name is derived from the default stem.
    /// Default: None
    pub output_name: Option<String>,

    /// Whether to write the JSON analysis report alongside the row set.
    /// Default: true
    pub generate_report: bool,

    /// Whether to write results to disk at all.
    /// When false, results are kept in memory only (useful for library
    /// callers and tests).
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_min_count: 5,
            top_neighborhoods: 10,
            output_dir: PathBuf::from("outputs"),
            output_name: None,
            generate_report: true,
            save_to_disk: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.top_neighborhoods == 0 {
            return Err(ConfigValidationError::InvalidTopNeighborhoods(
                self.top_neighborhoods,
            ));
        }

        if let Some(name) = &self.output_name
            && name.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyOutputName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid top_neighborhoods: {0} (must be at least 1)")]
    InvalidTopNeighborhoods(usize),

    #[error("Output name must not be empty")]
    EmptyOutputName,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    segment_min_count: Option<usize>,
    top_neighborhoods: Option<usize>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    generate_report: Option<bool>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the strict lower bound on segment size.
    ///
    /// A (neighborhood, building class) segment only gets its own statistics
    /// when it holds strictly more rows than this.
    pub fn segment_min_count(mut self, count: usize) -> Self {
        self.segment_min_count = Some(count);
        self
    }

    /// Set how many neighborhoods the report summary ranks by count.
    pub fn top_neighborhoods(mut self, count: usize) -> Self {
        self.top_neighborhoods = Some(count);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable JSON report generation.
    pub fn generate_report(mut self, enabled: bool) -> Self {
        self.generate_report = Some(enabled);
        self
    }

    /// Enable or disable writing results to disk.
    pub fn save_to_disk(mut self, enabled: bool) -> Self {
        self.save_to_disk = Some(enabled);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            segment_min_count: self.segment_min_count.unwrap_or(defaults.segment_min_count),
            top_neighborhoods: self.top_neighborhoods.unwrap_or(defaults.top_neighborhoods),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            generate_report: self.generate_report.unwrap_or(defaults.generate_report),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.segment_min_count, 5);
        assert_eq!(config.top_neighborhoods, 10);
        assert!(config.generate_report);
        assert!(config.save_to_disk);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder()
            .segment_min_count(3)
            .top_neighborhoods(25)
            .output_dir("/tmp/reports")
            .output_name("q3_sales")
            .save_to_disk(false)
            .build()
            .unwrap();

        assert_eq!(config.segment_min_count, 3);
        assert_eq!(config.top_neighborhoods, 25);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.output_name.as_deref(), Some("q3_sales"));
        assert!(!config.save_to_disk);
    }

    #[test]
    fn test_zero_top_neighborhoods_rejected() {
        let result = PipelineConfig::builder().top_neighborhoods(0).build();
        assert!(matches!(
            result,
            Err(ConfigValidationError::InvalidTopNeighborhoods(0))
        ));
    }

    #[test]
    fn test_empty_output_name_rejected() {
        let result = PipelineConfig::builder().output_name("  ").build();
        assert!(matches!(result, Err(ConfigValidationError::EmptyOutputName)));
    }

    #[test]
    fn test_zero_segment_min_count_allowed() {
        // A zero gate means every non-empty segment qualifies
        let config = PipelineConfig::builder().segment_min_count(0).build();
        assert!(config.is_ok());
    }
}
