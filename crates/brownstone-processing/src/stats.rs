//! Aggregation stage: global and per-segment sale-price statistics.
//!
//! All reductions here are commutative and associative over an immutable
//! snapshot, so results never depend on input row order.

use crate::error::{AnalysisError, Result};
use crate::schema::{BUILDING_CLASS_CATEGORY, NEIGHBORHOOD, SALE_PRICE};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Mean and spread of sale price over every cleaned row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub mean: f64,
    /// Sample standard deviation; absent for fewer than two rows.
    pub stddev: Option<f64>,
    pub count: usize,
}

/// A (neighborhood, building class) grouping used for localized statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentKey {
    pub neighborhood: String,
    pub building_class: String,
}

/// Mean and spread of sale price within one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub mean: f64,
    /// Sample standard deviation; absent for fewer than two rows.
    pub stddev: Option<f64>,
    pub count: usize,
}

/// The aggregation output: one global figure plus qualifying segments.
#[derive(Debug, Clone)]
pub struct SalesStats {
    pub global: GlobalStats,
    pub segments: HashMap<SegmentKey, SegmentStats>,
}

/// The statistics a z-score is computed against: the record's own segment,
/// or the global figures when the segment is too small or has no usable
/// spread.
#[derive(Debug, Clone, Copy)]
pub enum StatsBasis<'a> {
    Segment(&'a SegmentStats),
    Global(&'a GlobalStats),
}

impl StatsBasis<'_> {
    pub fn mean(&self) -> f64 {
        match self {
            StatsBasis::Segment(s) => s.mean,
            StatsBasis::Global(g) => g.mean,
        }
    }

    pub fn stddev(&self) -> Option<f64> {
        match self {
            StatsBasis::Segment(s) => s.stddev,
            StatsBasis::Global(g) => g.stddev,
        }
    }

    /// True when the global fallback was selected.
    pub fn is_fallback(&self) -> bool {
        matches!(self, StatsBasis::Global(_))
    }
}

impl SalesStats {
    /// Resolve the z-score basis for a segment key.
    ///
    /// Segment statistics are used only when the segment was materialized
    /// (count above the gate) and its stddev is positive; anything else
    /// falls back to the global figures.
    pub fn basis_for(&self, key: &SegmentKey) -> StatsBasis<'_> {
        match self.segments.get(key) {
            Some(segment) if segment.stddev.is_some_and(|s| s > 0.0) => {
                StatsBasis::Segment(segment)
            }
            _ => StatsBasis::Global(&self.global),
        }
    }
}

/// Aggregator over the cleaned sales frame.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Compute global statistics and the per-segment mapping.
    ///
    /// Segments are only materialized when they hold strictly more than
    /// `segment_min_count` rows.
    pub fn aggregate(&self, df: &DataFrame, segment_min_count: usize) -> Result<SalesStats> {
        let neigh_col = df.column(NEIGHBORHOOD)?;
        let neigh = neigh_col.as_materialized_series().str()?.clone();
        let class_col = df.column(BUILDING_CLASS_CATEGORY)?;
        let class = class_col.as_materialized_series().str()?.clone();
        let price_col = df.column(SALE_PRICE)?;
        let prices = price_col.as_materialized_series().f64()?.clone();

        let mut all_prices: Vec<f64> = Vec::with_capacity(df.height());
        let mut by_segment: HashMap<SegmentKey, Vec<f64>> = HashMap::new();

        for i in 0..df.height() {
            let Some(price) = prices.get(i) else { continue };
            all_prices.push(price);

            let key = SegmentKey {
                neighborhood: neigh.get(i).unwrap_or("").to_string(),
                building_class: class.get(i).unwrap_or("").to_string(),
            };
            by_segment.entry(key).or_default().push(price);
        }

        if all_prices.is_empty() {
            return Err(AnalysisError::EmptySource);
        }

        let global = GlobalStats {
            mean: mean(&all_prices),
            stddev: sample_stddev(&all_prices),
            count: all_prices.len(),
        };

        let total_segments = by_segment.len();
        let segments: HashMap<SegmentKey, SegmentStats> = by_segment
            .into_iter()
            .filter(|(_, values)| values.len() > segment_min_count)
            .map(|(key, values)| {
                let stats = SegmentStats {
                    mean: mean(&values),
                    stddev: sample_stddev(&values),
                    count: values.len(),
                };
                (key, stats)
            })
            .collect();

        debug!(
            "Aggregated {} rows into {} segments ({} qualifying)",
            global.count,
            total_segments,
            segments.len()
        );

        Ok(SalesStats { global, segments })
    }
}

/// Arithmetic mean of a non-empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (divide by n - 1).
///
/// This is the one spread formula used throughout the pipeline, so global
/// and segment z-scores share the convention. Absent for n <= 1 rather than
/// zero: a zero would be indistinguishable from a real zero-variance
/// segment.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n <= 1 {
        return None;
    }

    let mean = mean(values);
    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n as f64 - 1.0);

    Some(variance.sqrt())
}

/// Sample skewness; absent when the spread is absent or zero.
pub fn sample_skewness(values: &[f64]) -> Option<f64> {
    let stddev = sample_stddev(values)?;
    if stddev == 0.0 {
        return None;
    }

    let mean = mean(values);
    let n = values.len() as f64;
    let skew_sum: f64 = values.iter().map(|v| ((v - mean) / stddev).powi(3)).sum();

    Some(skew_sum / n)
}
