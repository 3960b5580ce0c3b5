//! Shared DataFrame helpers.
//!
//! Cell access here never fails on content: values that cannot be represented
//! as text become `None`, and a missing column reads as all-null where the
//! caller asks for that behavior.

use crate::error::{FeatureError, Result};
use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Whether the DataFrame has a column with this name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Column names as owned strings, in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Render every cell of a Series as text.
///
/// Non-string columns are cast; if a cast is not supported the value's display
/// form is used instead. Nulls stay `None`.
pub fn series_to_strings(series: &Series) -> Vec<Option<String>> {
    if let Ok(cast) = series.cast(&DataType::String)
        && let Ok(strings) = cast.str()
    {
        return strings
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
    }

    (0..series.len())
        .map(|i| match series.get(i) {
            Ok(AnyValue::Null) | Err(_) => None,
            Ok(value) => Some(value.to_string()),
        })
        .collect()
}

/// Text values of a column; a missing column reads as all-null.
pub fn string_values_or_empty(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    match df.column(name) {
        Ok(column) => series_to_strings(column.as_materialized_series()),
        Err(_) => vec![None; df.height()],
    }
}

/// Text values of a column that must exist.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| FeatureError::ColumnNotFound(name.to_string()))?;
    Ok(series_to_strings(column.as_materialized_series()))
}

/// Float view of a column that must exist.
///
/// Values that cannot be cast, and NaN, read as null.
pub fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(name)
        .map_err(|_| FeatureError::ColumnNotFound(name.to_string()))?;
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Float values of a column that must exist.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(float_column(df, name)?.into_iter().collect())
}

/// Drop duplicate rows, keeping the first occurrence and the original order.
///
/// With `subset = None` all columns are compared. Nulls compare equal.
pub fn drop_duplicates(df: &DataFrame, subset: Option<&[String]>) -> Result<DataFrame> {
    if let Some(cols) = subset
        && let Some(missing) = cols.iter().find(|c| !has_column(df, c))
    {
        return Err(FeatureError::ColumnNotFound(missing.clone()));
    }
    Ok(df.unique_stable(subset, UniqueKeepStrategy::First, None)?)
}

/// Number of rows that repeat an earlier row (on `subset`, or all columns).
pub fn duplicate_count(df: &DataFrame, subset: Option<&[String]>) -> Result<usize> {
    Ok(df.height() - drop_duplicates(df, subset)?.height())
}
