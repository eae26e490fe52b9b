//! Cleaning stage: validates and casts the raw sales frame.
//!
//! Per-field contract:
//! - numeric fields get a fallible cast; a failed cast yields null, never an
//!   error;
//! - a row must carry a positive SALE_PRICE, TOTAL_UNITS and
//!   GROSS_SQUARE_FEET or it is excluded entirely (tallied, never fatal);
//! - labels are trimmed and upper-cased; an empty label after trimming is a
//!   valid value;
//! - the address is trimmed only;
//! - an unparseable SALE_DATE becomes null and the row is kept.
//!
//! No retries, no partial-record repair.

mod casts;
mod sanitizers;

use crate::error::{AnalysisError, Result};
use crate::schema::{
    ADDRESS, BUILDING_CLASS_CATEGORY, FLOAT_COLUMNS, GROSS_SQUARE_FEET, INT_COLUMNS, NEIGHBORHOOD,
    SALE_DATE, SALE_PRICE, SOURCE_COLUMNS, TOTAL_UNITS,
};
use crate::types::{CleaningOutcome, DropCounts};
use casts::{cast_date_column, cast_float_column, cast_int_column};
use polars::prelude::*;
use sanitizers::{normalize_label_column, trim_column};
use tracing::{debug, info};

/// Cleaner for the raw sales frame.
pub struct SalesCleaner;

impl SalesCleaner {
    /// Clean a raw frame into typed, validated rows.
    ///
    /// Fails only on whole-run conditions (a missing source column); rows
    /// that fail validation are silently excluded and tallied.
    pub fn clean(&self, df: DataFrame) -> Result<CleaningOutcome> {
        for col in SOURCE_COLUMNS {
            if df.column(col).is_err() {
                return Err(AnalysisError::ColumnNotFound(col.to_string()));
            }
        }

        let rows_in = df.height();
        let mut df = df;
        let mut actions = Vec::new();

        info!("Cleaning {} rows...", rows_in);

        // 1. Label and address normalization
        for col in [NEIGHBORHOOD, BUILDING_CLASS_CATEGORY] {
            let normalized = normalize_label_column(df.column(col)?.as_materialized_series())
                .map_err(|e| AnalysisError::CleaningFailed(e.to_string()))?;
            df.replace(col, normalized)?;
        }
        let trimmed = trim_column(df.column(ADDRESS)?.as_materialized_series())
            .map_err(|e| AnalysisError::CleaningFailed(e.to_string()))?;
        df.replace(ADDRESS, trimmed)?;
        actions.push("Normalized segment labels (trimmed, upper-cased)".to_string());

        // 2. Fallible numeric and date casts
        for col in FLOAT_COLUMNS {
            let cast = cast_float_column(df.column(col)?.as_materialized_series())
                .map_err(|e| AnalysisError::CleaningFailed(e.to_string()))?;
            df.replace(col, cast)?;
        }
        for col in INT_COLUMNS {
            let cast = cast_int_column(df.column(col)?.as_materialized_series())
                .map_err(|e| AnalysisError::CleaningFailed(e.to_string()))?;
            df.replace(col, cast)?;
        }
        let dates = cast_date_column(df.column(SALE_DATE)?.as_materialized_series())
            .map_err(|e| AnalysisError::CleaningFailed(e.to_string()))?;
        let unparsed_dates = dates.null_count();
        df.replace(SALE_DATE, dates)?;
        actions.push("Cast numeric and date fields (failed casts become null)".to_string());
        if unparsed_dates > 0 {
            debug!("{} sale dates could not be parsed", unparsed_dates);
        }

        // 3. Required-field check
        let drops = tally_drops(&df)?;
        let mask = required_mask(&df)?;
        let kept = df.filter(&mask)?;
        let rows_dropped = rows_in - kept.height();

        if rows_dropped > 0 {
            let pct = (rows_dropped as f64 / rows_in as f64) * 100.0;
            actions.push(format!(
                "Dropped {} rows without a positive SALE_PRICE, TOTAL_UNITS and GROSS_SQUARE_FEET ({:.1}%)",
                rows_dropped, pct
            ));
            debug!(
                "Dropped {} rows (sale_price: {}, total_units: {}, gross_square_feet: {})",
                rows_dropped,
                drops.invalid_sale_price,
                drops.invalid_total_units,
                drops.invalid_gross_square_feet
            );
        } else {
            actions.push("All rows passed the required-field check".to_string());
        }

        info!("Cleaning complete: {} of {} rows kept", kept.height(), rows_in);

        Ok(CleaningOutcome {
            frame: kept,
            rows_in,
            rows_dropped,
            drops,
            actions,
        })
    }
}

/// Mask of rows carrying a positive value in every required field.
fn required_mask(df: &DataFrame) -> Result<BooleanChunked> {
    let price = df.column(SALE_PRICE)?.as_materialized_series().f64()?.clone();
    let units = df.column(TOTAL_UNITS)?.as_materialized_series().i64()?.clone();
    let sqft = df
        .column(GROSS_SQUARE_FEET)?
        .as_materialized_series()
        .f64()?
        .clone();

    let mut mask = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let ok = matches!(price.get(i), Some(v) if v > 0.0)
            && matches!(units.get(i), Some(v) if v > 0)
            && matches!(sqft.get(i), Some(v) if v > 0.0);
        mask.push(ok);
    }

    Ok(BooleanChunked::from_slice("required".into(), &mask))
}

/// Count rows failing each required field, before filtering.
fn tally_drops(df: &DataFrame) -> Result<DropCounts> {
    let price = df.column(SALE_PRICE)?.as_materialized_series().f64()?.clone();
    let units = df.column(TOTAL_UNITS)?.as_materialized_series().i64()?.clone();
    let sqft = df
        .column(GROSS_SQUARE_FEET)?
        .as_materialized_series()
        .f64()?
        .clone();

    let mut drops = DropCounts::default();
    for i in 0..df.height() {
        if !matches!(price.get(i), Some(v) if v > 0.0) {
            drops.invalid_sale_price += 1;
        }
        if !matches!(units.get(i), Some(v) if v > 0) {
            drops.invalid_total_units += 1;
        }
        if !matches!(sqft.get(i), Some(v) if v > 0.0) {
            drops.invalid_gross_square_feet += 1;
        }
    }

    Ok(drops)
}
