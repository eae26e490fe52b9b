//! Fallible per-column casts from the loosely-typed source frame.
//!
//! Every cast yields null for an unreadable value; no cast is ever an error
//! on its own. Rows are only rejected by the required-field check in
//! [`super::SalesCleaner`].

use crate::utils::{
    date_to_epoch_days, is_numeric_dtype, parse_integer_string, parse_numeric_string,
    parse_sale_date,
};
use anyhow::Result;
use polars::prelude::*;

/// Cast a column to Float64, parsing string values fallibly.
pub(crate) fn cast_float_column(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::String => {
            let str_chunked = series.str()?;
            let mut values: Vec<Option<f64>> = Vec::with_capacity(str_chunked.len());

            for opt_val in str_chunked.into_iter() {
                values.push(opt_val.and_then(parse_numeric_string));
            }

            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) => Ok(series.cast(&DataType::Float64)?),
        _ => Ok(Series::full_null(
            series.name().clone(),
            series.len(),
            &DataType::Float64,
        )),
    }
}

/// Cast a column to Int64, parsing string values fallibly (float-first, so
/// values like "2.0" survive).
pub(crate) fn cast_int_column(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::String => {
            let str_chunked = series.str()?;
            let mut values: Vec<Option<i64>> = Vec::with_capacity(str_chunked.len());

            for opt_val in str_chunked.into_iter() {
                values.push(opt_val.and_then(parse_integer_string));
            }

            Ok(Series::new(series.name().clone(), values))
        }
        dtype if is_numeric_dtype(dtype) => Ok(series.cast(&DataType::Int64)?),
        _ => Ok(Series::full_null(
            series.name().clone(),
            series.len(),
            &DataType::Int64,
        )),
    }
}

/// Cast a column to Date, parsing string values against the accepted format
/// list. Unparseable dates become null; the row is retained.
pub(crate) fn cast_date_column(series: &Series) -> Result<Series> {
    match series.dtype() {
        DataType::Date => Ok(series.clone()),
        DataType::String => {
            let str_chunked = series.str()?;
            let mut days: Vec<Option<i32>> = Vec::with_capacity(str_chunked.len());

            for opt_val in str_chunked.into_iter() {
                days.push(
                    opt_val
                        .and_then(parse_sale_date)
                        .map(date_to_epoch_days),
                );
            }

            Ok(Series::new(series.name().clone(), days).cast(&DataType::Date)?)
        }
        _ => {
            let nulls = Series::full_null(series.name().clone(), series.len(), &DataType::Int32);
            Ok(nulls.cast(&DataType::Date)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_float_column_from_strings() {
        let series = Series::new(
            "SALE_PRICE".into(),
            &[
                Some("$1,250,000"),
                Some("0"),
                Some("-"),
                Some("abc"),
                None,
            ],
        );
        let cast = cast_float_column(&series).unwrap();
        let values = cast.f64().unwrap();

        assert_eq!(values.get(0), Some(1_250_000.0));
        assert_eq!(values.get(1), Some(0.0));
        assert_eq!(values.get(2), None);
        assert_eq!(values.get(3), None);
        assert_eq!(values.get(4), None);
    }

    #[test]
    fn test_cast_float_column_already_numeric() {
        let series = Series::new("GROSS_SQUARE_FEET".into(), &[Some(2000i64), None]);
        let cast = cast_float_column(&series).unwrap();
        assert_eq!(cast.dtype(), &DataType::Float64);
        assert_eq!(cast.f64().unwrap().get(0), Some(2000.0));
    }

    #[test]
    fn test_cast_int_column_from_strings() {
        let series = Series::new("TOTAL_UNITS".into(), &[Some("2"), Some("3.0"), Some("n/a")]);
        let cast = cast_int_column(&series).unwrap();
        let values = cast.i64().unwrap();

        assert_eq!(values.get(0), Some(2));
        assert_eq!(values.get(1), Some(3));
        assert_eq!(values.get(2), None);
    }

    #[test]
    fn test_cast_date_column() {
        let series = Series::new(
            "SALE_DATE".into(),
            &[Some("2016-09-23"), Some("not-a-date"), None],
        );
        let cast = cast_date_column(&series).unwrap();

        assert_eq!(cast.dtype(), &DataType::Date);
        assert_eq!(cast.null_count(), 2);
    }

    #[test]
    fn test_cast_unsupported_carrier_yields_nulls() {
        let series = Series::new("SALE_PRICE".into(), &[Some(true), Some(false)]);
        let cast = cast_float_column(&series).unwrap();
        assert_eq!(cast.dtype(), &DataType::Float64);
        assert_eq!(cast.null_count(), 2);
    }
}
