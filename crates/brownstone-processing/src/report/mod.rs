//! Formatter/Reporter stage: presentation ordering, numeric rendering, and
//! report-level summaries.
//!
//! This stage never recomputes row statistics; it formats and orders what
//! the metric stage produced, plus read-only reductions for the narrative
//! (top neighborhoods by count, log-price distribution shape, date range).

mod format;

pub use format::{format_currency, format_thousands, format_zscore};

use crate::error::Result;
use crate::schema::{
    ADDRESS, BLOCK, BOROUGH, BUILDING_CLASS_CATEGORY, FORMATTED_SALE_PRICE, LOT, NEIGHBORHOOD,
    PRICE_PER_UNIT, RAW_SALE_PRICE, SALE_DATE, SALE_PRICE, SALE_PRICE_ZSCORE,
    SALE_PRICE_ZSCORE_NEIGHBORHOOD, SQUARE_FT_PER_UNIT, ZIP_CODE,
};
use crate::stats::{sample_skewness, sample_stddev, SalesStats};
use crate::types::{
    AnalysisRun, CleaningOutcome, NeighborhoodCount, PriceDistribution, SaleDateRange, SalesReport,
    SalesReportSummary,
};
use crate::utils::epoch_days_to_date;
use chrono::Local;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Writes the presentation row set and the JSON analysis report.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Stable presentation ordering: neighborhood, then building class, then
    /// address, all ascending over the case-normalized labels.
    pub fn order_rows(&self, df: &DataFrame) -> Result<DataFrame> {
        df.sort(
            [NEIGHBORHOOD, BUILDING_CLASS_CATEGORY, ADDRESS],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .map_err(Into::into)
    }

    /// Build the presentation row set: ordered rows with the contract column
    /// names and formats.
    pub fn presentation_frame(&self, enriched: &DataFrame) -> Result<DataFrame> {
        let ordered = self.order_rows(enriched)?;
        let mut columns: Vec<Column> = Vec::with_capacity(13);

        for name in [NEIGHBORHOOD, ADDRESS, BOROUGH, BLOCK, LOT, ZIP_CODE, BUILDING_CLASS_CATEGORY]
        {
            columns.push(ordered.column(name)?.clone());
        }

        let prices = ordered.column(SALE_PRICE)?.as_materialized_series().f64()?.clone();

        let formatted: Vec<Option<String>> = (&prices)
            .into_iter()
            .map(|opt| opt.map(format_currency))
            .collect();
        columns.push(Series::new(FORMATTED_SALE_PRICE.into(), formatted).into_column());

        let mut raw = ordered.column(SALE_PRICE)?.as_materialized_series().clone();
        raw.rename(RAW_SALE_PRICE.into());
        columns.push(raw.into_column());

        for name in [SALE_PRICE_ZSCORE, SALE_PRICE_ZSCORE_NEIGHBORHOOD] {
            let zscores = ordered.column(name)?.as_materialized_series().f64()?.clone();
            let rendered: Vec<Option<String>> = (&zscores)
                .into_iter()
                .map(|opt| opt.map(format_zscore))
                .collect();
            columns.push(Series::new(name.into(), rendered).into_column());
        }

        let sqft = ordered
            .column(SQUARE_FT_PER_UNIT)?
            .as_materialized_series()
            .f64()?
            .clone();
        let rendered: Vec<Option<String>> = (&sqft)
            .into_iter()
            .map(|opt| opt.map(format_thousands))
            .collect();
        columns.push(Series::new(SQUARE_FT_PER_UNIT.into(), rendered).into_column());

        let per_unit = ordered.column(PRICE_PER_UNIT)?.as_materialized_series().f64()?.clone();
        let rendered: Vec<Option<String>> = (&per_unit)
            .into_iter()
            .map(|opt| opt.map(format_currency))
            .collect();
        columns.push(Series::new(PRICE_PER_UNIT.into(), rendered).into_column());

        Ok(DataFrame::new(columns)?)
    }

    /// Derive the narrative summary from the run's artifacts.
    ///
    /// Pure read-only reductions; nothing here re-derives row statistics.
    pub fn build_summary(
        &self,
        cleaning: &CleaningOutcome,
        stats: &SalesStats,
        enriched: &DataFrame,
        top_n: usize,
    ) -> Result<SalesReportSummary> {
        // Top neighborhoods by transaction count, ties broken by name so the
        // ranking is deterministic.
        let neigh = enriched.column(NEIGHBORHOOD)?.as_materialized_series().str()?.clone();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for opt_val in (&neigh).into_iter().flatten() {
            *counts.entry(opt_val.to_string()).or_insert(0) += 1;
        }
        let mut ranked: Vec<NeighborhoodCount> = counts
            .into_iter()
            .map(|(neighborhood, transactions)| NeighborhoodCount {
                neighborhood,
                transactions,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.transactions
                .cmp(&a.transactions)
                .then_with(|| a.neighborhood.cmp(&b.neighborhood))
        });
        ranked.truncate(top_n);

        // Log-transformed sale price distribution for the narrative
        let prices = enriched.column(SALE_PRICE)?.as_materialized_series().f64()?.clone();
        let log_prices: Vec<f64> = (&prices)
            .into_iter()
            .flatten()
            .filter(|p| *p > 0.0)
            .map(f64::ln)
            .collect();

        let log_sale_price = if log_prices.is_empty() {
            PriceDistribution {
                mean: 0.0,
                stddev: None,
                skewness: None,
                shape: "undetermined".to_string(),
            }
        } else {
            let skewness = sample_skewness(&log_prices);
            let shape = match skewness {
                Some(s) if s.abs() < 1.0 => "normal",
                Some(_) => "skewed",
                None => "undetermined",
            };
            PriceDistribution {
                mean: log_prices.iter().sum::<f64>() / log_prices.len() as f64,
                stddev: sample_stddev(&log_prices),
                skewness,
                shape: shape.to_string(),
            }
        };

        let sale_date_range = date_range(enriched)?;

        Ok(SalesReportSummary {
            rows_loaded: cleaning.rows_in,
            rows_kept: cleaning.frame.height(),
            rows_dropped: cleaning.rows_dropped,
            drops: cleaning.drops,
            global_mean_sale_price: stats.global.mean,
            global_stddev_sale_price: stats.global.stddev,
            qualifying_segments: stats.segments.len(),
            top_neighborhoods: ranked,
            log_sale_price,
            sale_date_range,
        })
    }

    /// Build the full report from a finished run.
    pub fn build_report(input_file: &str, run: &AnalysisRun) -> SalesReport {
        SalesReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: run
                .output_path
                .as_ref()
                .map(|p| p.display().to_string()),
            duration_ms: run.duration_ms,
            summary: run.summary.clone(),
            cleaning_actions: run.cleaning_actions.clone(),
        }
    }

    /// Write the presentation row set as CSV.
    pub fn write_rows_csv(&self, df: &mut DataFrame, default_stem: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let file_name = self
            .output_name
            .clone()
            .unwrap_or_else(|| default_stem.to_string());
        let path = self.output_dir.join(format!("{}.csv", file_name));
        let mut file = File::create(&path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)?;

        info!("Row set saved: {}", path.display());
        Ok(path)
    }

    /// Write the JSON report to `<base_name>_report.json`.
    pub fn write_report_json(&self, report: &SalesReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(format!("{}_report.json", base_name));
        let mut file = File::create(&path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(path)
    }
}

/// Earliest and latest parsed sale dates, when the column carries any.
fn date_range(df: &DataFrame) -> Result<Option<SaleDateRange>> {
    let Ok(col) = df.column(SALE_DATE) else {
        return Ok(None);
    };

    let days = col.as_materialized_series().cast(&DataType::Int32)?;
    let days = days.i32()?;

    Ok(match (days.min(), days.max()) {
        (Some(min), Some(max)) => Some(SaleDateRange {
            earliest: epoch_days_to_date(min).format("%Y-%m-%d").to_string(),
            latest: epoch_days_to_date(max).format("%Y-%m-%d").to_string(),
        }),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OUTPUT_COLUMNS;
    use crate::types::DropCounts;
    use pretty_assertions::assert_eq;

    fn enriched_frame() -> DataFrame {
        df![
            NEIGHBORHOOD => ["SOHO", "HARLEM", "HARLEM", "CHELSEA"],
            BUILDING_CLASS_CATEGORY => ["A1", "B2", "B1", "C0"],
            BOROUGH => [1i64, 1, 1, 1],
            BLOCK => [512i64, 1710, 1711, 700],
            LOT => [1i64, 2, 3, 4],
            ZIP_CODE => [10013i64, 10026, 10026, 10001],
            SALE_PRICE => [1_000_000.0, 750_000.0, 800_000.0, 2_000_000.0],
            ADDRESS => ["100 Grand St", "2 W 120th St", "4 W 120th St", "200 10th Ave"],
            SALE_PRICE_ZSCORE => [Some(0.5), Some(-0.25), None, Some(1.0)],
            SALE_PRICE_ZSCORE_NEIGHBORHOOD => [Some(0.5), Some(-0.25), None, Some(1.0)],
            SQUARE_FT_PER_UNIT => [1000.0, 1800.0, 1750.0, 2500.0],
            PRICE_PER_UNIT => [500_000.0, 750_000.0, 800_000.0, 1_000_000.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_presentation_frame_column_contract() {
        let generator = ReportGenerator::default();
        let frame = generator.presentation_frame(&enriched_frame()).unwrap();

        let names: Vec<&str> = frame
            .get_column_names()
            .iter()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(names, OUTPUT_COLUMNS.to_vec());
    }

    #[test]
    fn test_presentation_frame_is_ordered() {
        let generator = ReportGenerator::default();
        let frame = generator.presentation_frame(&enriched_frame()).unwrap();

        let neigh_col = frame.column(NEIGHBORHOOD).unwrap().as_materialized_series().clone();
        let neigh = neigh_col.str().unwrap();
        assert_eq!(neigh.get(0), Some("CHELSEA"));
        assert_eq!(neigh.get(1), Some("HARLEM"));
        assert_eq!(neigh.get(2), Some("HARLEM"));
        assert_eq!(neigh.get(3), Some("SOHO"));

        // Secondary key: building class within HARLEM
        let class_col = frame.column(BUILDING_CLASS_CATEGORY).unwrap().as_materialized_series().clone();
        let class = class_col.str().unwrap();
        assert_eq!(class.get(1), Some("B1"));
        assert_eq!(class.get(2), Some("B2"));
    }

    #[test]
    fn test_presentation_frame_formats() {
        let generator = ReportGenerator::default();
        let frame = generator.presentation_frame(&enriched_frame()).unwrap();

        // CHELSEA sorts first
        let formatted_col = frame.column(FORMATTED_SALE_PRICE).unwrap().as_materialized_series().clone();
        assert_eq!(formatted_col.str().unwrap().get(0), Some("$2,000,000.00"));

        let z_col = frame.column(SALE_PRICE_ZSCORE).unwrap().as_materialized_series().clone();
        assert_eq!(z_col.str().unwrap().get(0), Some("1.0000"));

        let sqft_col = frame.column(SQUARE_FT_PER_UNIT).unwrap().as_materialized_series().clone();
        assert_eq!(sqft_col.str().unwrap().get(0), Some("2,500.00"));

        // Absent z-scores stay null, not "0.0000"
        let z = frame
            .column(SALE_PRICE_ZSCORE)
            .unwrap()
            .as_materialized_series()
            .clone();
        assert_eq!(z.null_count(), 1);

        // Raw price stays numeric
        let raw = frame.column(RAW_SALE_PRICE).unwrap().as_materialized_series().clone();
        assert_eq!(raw.dtype(), &DataType::Float64);
    }

    #[test]
    fn test_build_summary_top_neighborhoods() {
        let enriched = enriched_frame();
        let cleaning = CleaningOutcome {
            frame: enriched.clone(),
            rows_in: 6,
            rows_dropped: 2,
            drops: DropCounts {
                invalid_sale_price: 2,
                ..Default::default()
            },
            actions: vec![],
        };
        let stats = crate::stats::SalesAggregator.aggregate(&enriched, 5).unwrap();

        let generator = ReportGenerator::default();
        let summary = generator
            .build_summary(&cleaning, &stats, &enriched, 2)
            .unwrap();

        assert_eq!(summary.rows_loaded, 6);
        assert_eq!(summary.rows_kept, 4);
        assert_eq!(summary.rows_dropped, 2);
        assert_eq!(summary.top_neighborhoods.len(), 2);
        assert_eq!(summary.top_neighborhoods[0].neighborhood, "HARLEM");
        assert_eq!(summary.top_neighborhoods[0].transactions, 2);
        // Tie between SOHO and CHELSEA broken alphabetically
        assert_eq!(summary.top_neighborhoods[1].neighborhood, "CHELSEA");
        assert!(summary.log_sale_price.stddev.is_some());
    }
}
