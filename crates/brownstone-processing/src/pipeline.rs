//! The main analysis pipeline.
//!
//! One linear, synchronous pass: clean, aggregate, enrich, format. Each
//! stage consumes the full output of its predecessor and produces a new
//! derived value; nothing is mutated across stage boundaries and nothing
//! runs concurrently.

use crate::cleaner::SalesCleaner;
use crate::config::PipelineConfig;
use crate::enrich::MetricCalculator;
use crate::error::{AnalysisError, Result};
use crate::report::ReportGenerator;
use crate::stats::SalesAggregator;
use crate::types::AnalysisRun;
use polars::prelude::*;
use std::time::Instant;
use tracing::{error, info};

/// Default file stem for the written row set when no output name is set.
const DEFAULT_OUTPUT_STEM: &str = "enriched_sales";

/// The analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom
/// configuration.
///
/// # Example
///
/// ```rust,ignore
/// use brownstone_processing::{Pipeline, PipelineConfig};
///
/// let run = Pipeline::builder()
///     .config(PipelineConfig::builder().save_to_disk(false).build()?)
///     .build()?
///     .run(dataframe)?;
///
/// println!("{} rows enriched", run.presentation.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    cleaner: SalesCleaner,
    aggregator: SalesAggregator,
    calculator: MetricCalculator,
    reporter: ReportGenerator,
}

// The pipeline may be driven from a background thread by library callers.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over a raw sales frame.
    ///
    /// # Errors
    ///
    /// Fails on whole-run conditions only: an empty source, a missing
    /// source column, or an IO failure while writing output. Per-row
    /// validation failures are tallied, never fatal.
    pub fn run(&self, df: DataFrame) -> Result<AnalysisRun> {
        match self.run_internal(df) {
            Ok(run) => Ok(run),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self, df: DataFrame) -> Result<AnalysisRun> {
        let started = Instant::now();

        if df.height() == 0 {
            return Err(AnalysisError::EmptySource);
        }

        info!("Stage 1/4: cleaning {} rows...", df.height());
        let cleaning = self.cleaner.clean(df)?;
        if cleaning.frame.height() == 0 {
            // Every row failed validation; there is nothing to report on
            return Err(AnalysisError::EmptySource);
        }

        info!("Stage 2/4: aggregating sale-price statistics...");
        let stats = self
            .aggregator
            .aggregate(&cleaning.frame, self.config.segment_min_count)?;

        info!("Stage 3/4: computing per-row metrics...");
        let enriched = self.calculator.enrich(&cleaning.frame, &stats)?;

        info!("Stage 4/4: formatting the report...");
        let mut presentation = self.reporter.presentation_frame(&enriched)?;
        let summary =
            self.reporter
                .build_summary(&cleaning, &stats, &enriched, self.config.top_neighborhoods)?;

        let output_path = if self.config.save_to_disk {
            Some(
                self.reporter
                    .write_rows_csv(&mut presentation, DEFAULT_OUTPUT_STEM)?,
            )
        } else {
            None
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let mut run = AnalysisRun {
            presentation,
            summary,
            cleaning_actions: cleaning.actions,
            duration_ms,
            output_path,
            report_path: None,
        };

        if self.config.save_to_disk && self.config.generate_report {
            // The pipeline sees a frame, not a file; CLI callers that know
            // the source path write their own report instead.
            let report = ReportGenerator::build_report("<in-memory frame>", &run);
            let stem = self
                .config
                .output_name
                .as_deref()
                .unwrap_or(DEFAULT_OUTPUT_STEM);
            run.report_path = Some(self.reporter.write_report_json(&report, stem)?);
        }

        info!(
            "Pipeline complete: {} rows in, {} rows out ({} ms)",
            run.summary.rows_loaded, run.summary.rows_kept, run.duration_ms
        );

        Ok(run)
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());

        Ok(Pipeline {
            config,
            cleaner: SalesCleaner,
            aggregator: SalesAggregator,
            calculator: MetricCalculator,
            reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn test_builder_defaults() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().segment_min_count, 5);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        // Bypass the config builder's own validation to exercise build()
        let config = PipelineConfig {
            top_neighborhoods: 0,
            ..Default::default()
        };
        let result = Pipeline::builder().config(config).build();
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_run_empty_frame_is_fatal() {
        let df = DataFrame::empty();
        let pipeline = Pipeline::builder()
            .config(
                PipelineConfig::builder()
                    .save_to_disk(false)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let err = pipeline.run(df).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptySource));
    }
}
