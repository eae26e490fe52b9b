//! Metric stage: per-row z-scores and per-unit ratios.
//!
//! A pure function of the cleaned frame and the aggregates; no side effects
//! and no ordering dependency between rows. Absent statistics stay absent
//! (null), never a sentinel zero.

use crate::error::Result;
use crate::schema::{
    BUILDING_CLASS_CATEGORY, GROSS_SQUARE_FEET, NEIGHBORHOOD, PRICE_PER_UNIT, SALE_PRICE,
    SALE_PRICE_ZSCORE, SALE_PRICE_ZSCORE_NEIGHBORHOOD, SQUARE_FT_PER_UNIT, TOTAL_UNITS,
};
use crate::stats::{SalesStats, SegmentKey};
use polars::prelude::*;
use tracing::debug;

/// Count of standard deviations `value` lies from `mean`.
///
/// Defined only for a positive spread; anything else yields an absent
/// z-score.
pub fn zscore(value: f64, mean: f64, stddev: Option<f64>) -> Option<f64> {
    match stddev {
        Some(s) if s > 0.0 => Some((value - mean) / s),
        _ => None,
    }
}

/// Computes the derived metric columns for the cleaned frame.
pub struct MetricCalculator;

impl MetricCalculator {
    /// Append `sale_price_zscore`, `sale_price_zscore_neighborhood`,
    /// `square_ft_per_unit` and `price_per_unit` to the cleaned frame.
    pub fn enrich(&self, df: &DataFrame, stats: &SalesStats) -> Result<DataFrame> {
        let height = df.height();

        let neigh_col = df.column(NEIGHBORHOOD)?;
        let neigh = neigh_col.as_materialized_series().str()?.clone();
        let class_col = df.column(BUILDING_CLASS_CATEGORY)?;
        let class = class_col.as_materialized_series().str()?.clone();
        let price_col = df.column(SALE_PRICE)?;
        let prices = price_col.as_materialized_series().f64()?.clone();
        let units_col = df.column(TOTAL_UNITS)?;
        let units = units_col.as_materialized_series().i64()?.clone();
        let sqft_col = df.column(GROSS_SQUARE_FEET)?;
        let sqft = sqft_col.as_materialized_series().f64()?.clone();

        let mut global_z: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut segment_z: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut sqft_per_unit: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut price_per_unit: Vec<Option<f64>> = Vec::with_capacity(height);
        let mut fallback_rows = 0usize;

        for i in 0..height {
            let price = prices.get(i);

            global_z
                .push(price.and_then(|p| zscore(p, stats.global.mean, stats.global.stddev)));

            let key = SegmentKey {
                neighborhood: neigh.get(i).unwrap_or("").to_string(),
                building_class: class.get(i).unwrap_or("").to_string(),
            };
            let basis = stats.basis_for(&key);
            if basis.is_fallback() {
                fallback_rows += 1;
            }
            segment_z.push(price.and_then(|p| zscore(p, basis.mean(), basis.stddev())));

            // The cleaner guarantees positive units for every surviving row,
            // so these divisions are always safe on cleaned input.
            sqft_per_unit.push(match (sqft.get(i), units.get(i)) {
                (Some(s), Some(u)) if u > 0 => Some(s / u as f64),
                _ => None,
            });
            price_per_unit.push(match (price, units.get(i)) {
                (Some(p), Some(u)) if u > 0 => Some(p / u as f64),
                _ => None,
            });
        }

        debug!(
            "Enriched {} rows ({} on global fallback statistics)",
            height, fallback_rows
        );

        let mut out = df.clone();
        out.with_column(Series::new(SALE_PRICE_ZSCORE.into(), global_z))?;
        out.with_column(Series::new(
            SALE_PRICE_ZSCORE_NEIGHBORHOOD.into(),
            segment_z,
        ))?;
        out.with_column(Series::new(SQUARE_FT_PER_UNIT.into(), sqft_per_unit))?;
        out.with_column(Series::new(PRICE_PER_UNIT.into(), price_per_unit))?;

        Ok(out)
    }
}
