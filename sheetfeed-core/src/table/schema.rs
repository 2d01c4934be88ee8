//! Canonical column names and ordering.

use crate::domain::FundamentalField;
use polars::prelude::*;

pub const COL_TICKER: &str = "Ticker";
pub const COL_DATE_TIME: &str = "date_time";
pub const COL_OPEN: &str = "open";
pub const COL_HIGH: &str = "high";
pub const COL_LOW: &str = "low";
pub const COL_CLOSE: &str = "close";
pub const COL_VOLUME: &str = "volume";

/// Columns that precede the fundamentals, in output order.
pub const BASE_COLUMNS: [&str; 7] = [
    COL_TICKER,
    COL_DATE_TIME,
    COL_OPEN,
    COL_HIGH,
    COL_LOW,
    COL_CLOSE,
    COL_VOLUME,
];

/// Full output ordering: base columns, then the configured fundamentals.
pub fn canonical_columns(fields: &[FundamentalField]) -> Vec<&'static str> {
    BASE_COLUMNS
        .iter()
        .copied()
        .chain(fields.iter().map(|f| f.column_name()))
        .collect()
}

/// Keep only canonical columns that exist in `df`, in canonical order.
///
/// Missing columns are not created; extra columns are dropped.
pub fn project(df: &DataFrame, fields: &[FundamentalField]) -> PolarsResult<DataFrame> {
    let present: Vec<&str> = canonical_columns(fields)
        .into_iter()
        .filter(|name| df.column(name).is_ok())
        .collect();
    df.select(present)
}
