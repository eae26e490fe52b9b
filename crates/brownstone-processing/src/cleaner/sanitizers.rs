//! String sanitization for label and address columns.

use crate::utils::normalize_label;
use anyhow::Result;
use polars::prelude::*;

/// Normalize a segment-label column: trim and upper-case every value.
///
/// Nulls become the empty string so every row lands in a well-defined
/// segment key; an empty label is a valid (if uninformative) value, not a
/// validity failure.
pub(crate) fn normalize_label_column(series: &Series) -> Result<Series> {
    let str_series = series.cast(&DataType::String)?;
    let str_chunked = str_series.str()?;
    let mut normalized = Vec::with_capacity(str_chunked.len());

    for opt_val in str_chunked.into_iter() {
        match opt_val {
            Some(val) => normalized.push(Some(normalize_label(val))),
            None => normalized.push(Some(String::new())),
        }
    }

    Ok(Series::new(series.name().clone(), normalized))
}

/// Trim surrounding whitespace from a free-text column, preserving case.
pub(crate) fn trim_column(series: &Series) -> Result<Series> {
    let str_series = series.cast(&DataType::String)?;
    let str_chunked = str_series.str()?;
    let mut trimmed = Vec::with_capacity(str_chunked.len());

    for opt_val in str_chunked.into_iter() {
        trimmed.push(opt_val.map(|val| val.trim().to_string()));
    }

    Ok(Series::new(series.name().clone(), trimmed))
}
