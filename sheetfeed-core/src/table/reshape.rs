//! Reshape a provider source frame into the flat row table.
//!
//! Two stages, because the collector fetches the snapshot only after the bar
//! series is known to be usable:
//! - [`normalize_bars`]: flatten labels, rename to canonical names, format
//!   timestamps, stamp the ticker
//! - [`attach_fundamentals`]: broadcast the snapshot, rescale market cap,
//!   project to the canonical ordering

use super::schema::{
    project, COL_CLOSE, COL_DATE_TIME, COL_HIGH, COL_LOW, COL_OPEN, COL_TICKER, COL_VOLUME,
};
use crate::data::provider::{
    DataError, LABEL_CLOSE, LABEL_DATE, LABEL_DATETIME, LABEL_HIGH, LABEL_LEVEL_SEPARATOR,
    LABEL_LOW, LABEL_OPEN, LABEL_VOLUME,
};
use crate::domain::{display_ticker, FieldValue, FundamentalField, Fundamentals};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Output format of the `date_time` column.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Source label -> canonical column.
const RENAMES: [(&str, &str); 7] = [
    (LABEL_DATETIME, COL_DATE_TIME),
    (LABEL_DATE, COL_DATE_TIME),
    (LABEL_OPEN, COL_OPEN),
    (LABEL_HIGH, COL_HIGH),
    (LABEL_LOW, COL_LOW),
    (LABEL_CLOSE, COL_CLOSE),
    (LABEL_VOLUME, COL_VOLUME),
];

const MARKET_CAP: &str = "marketCap";

/// Stage one: source frame -> per-bar rows stamped with the ticker.
pub fn normalize_bars(
    mut source: DataFrame,
    ticker: &str,
    suffixes: &[&str],
) -> Result<DataFrame, DataError> {
    flatten_labels(&mut source)?;
    rename_source_labels(&mut source)?;
    format_date_time(&mut source)?;

    let height = source.height();
    let display = display_ticker(ticker, suffixes);
    source.with_column(Column::new(COL_TICKER.into(), vec![display; height]))?;
    Ok(source)
}

/// Stage two: broadcast the snapshot onto every row and project.
///
/// Every configured field becomes a column, null-filled when the snapshot
/// does not carry it.
pub fn attach_fundamentals(
    mut rows: DataFrame,
    fundamentals: &Fundamentals,
    fields: &[FundamentalField],
) -> Result<DataFrame, DataError> {
    let height = rows.height();
    for &field in fields {
        let name = field.column_name();
        let column = match fundamentals.get(field) {
            FieldValue::Text(value) => Column::new(name.into(), vec![value; height]),
            FieldValue::Number(value) => Column::new(name.into(), vec![value; height]),
        };
        rows.with_column(column)?;
    }

    rescale_market_cap(&mut rows)?;
    Ok(project(&rows, fields)?)
}

/// Market cap in billions, rounded to two decimals. Non-finite input is absent.
pub fn market_cap_billions(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    Some((raw / 1e9 * 100.0).round() / 100.0)
}

/// Replace hierarchical labels (`outer|inner`) with their innermost level.
fn flatten_labels(df: &mut DataFrame) -> Result<(), DataError> {
    relabel_columns(df, |name| {
        name.rsplit(LABEL_LEVEL_SEPARATOR)
            .next()
            .filter(|inner| *inner != name)
            .map(|inner| inner.trim().to_string())
    })
}

fn rename_source_labels(df: &mut DataFrame) -> Result<(), DataError> {
    relabel_columns(df, |name| {
        RENAMES
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, canonical)| canonical.to_string())
    })?;
    if df.column(COL_DATE_TIME).is_err() {
        return Err(DataError::Frame(format!(
            "source frame has neither '{LABEL_DATETIME}' nor '{LABEL_DATE}' column"
        )));
    }
    Ok(())
}

/// Rebuild `df` with each column renamed by `relabel` (`None` keeps the name).
///
/// `DataFrame::rename` validates against a cached schema that an earlier
/// in-place rename can leave stale, so the frame is rebuilt from its columns.
fn relabel_columns(
    df: &mut DataFrame,
    relabel: impl Fn(&str) -> Option<String>,
) -> Result<(), DataError> {
    let columns: Vec<Column> = std::mem::replace(df, DataFrame::empty())
        .take_columns()
        .into_iter()
        .map(|column| {
            let renamed = relabel(column.name().as_str());
            match renamed {
                Some(name) => column.with_name(name.into()),
                None => column,
            }
        })
        .collect();
    *df = DataFrame::new(columns)?;
    Ok(())
}

/// Rewrite `date_time` as `YYYY-MM-DD HH:MM` strings.
fn format_date_time(df: &mut DataFrame) -> Result<(), DataError> {
    let column = df.column(COL_DATE_TIME)?;
    let naive: Vec<Option<NaiveDateTime>> = match column.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let ticks = column.cast(&DataType::Int64)?;
            ticks
                .i64()?
                .into_iter()
                .map(|v| v.and_then(|v| datetime_from_ticks(v, unit)))
                .collect()
        }
        DataType::Date => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .ok_or_else(|| DataError::Frame("invalid epoch".into()))?;
            let days = column.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|v| v.map(|d| epoch + chrono::Duration::days(d as i64)))
                .collect()
        }
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map(parse_timestamp_text).transpose())
            .collect::<Result<_, _>>()?,
        other => {
            return Err(DataError::Frame(format!(
                "unsupported timestamp type {other:?}"
            )))
        }
    };

    let formatted: Vec<Option<String>> = naive
        .into_iter()
        .map(|dt| dt.map(|dt| dt.format(DATE_TIME_FORMAT).to_string()))
        .collect();
    df.with_column(Column::new(COL_DATE_TIME.into(), formatted))?;
    Ok(())
}

fn datetime_from_ticks(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(value)),
    };
    utc.map(|dt| dt.naive_utc())
}

fn parse_timestamp_text(text: &str) -> Result<NaiveDateTime, DataError> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DataError::Frame(format!("unparseable timestamp '{text}'")))
}

fn rescale_market_cap(df: &mut DataFrame) -> Result<(), DataError> {
    let Ok(column) = df.column(MARKET_CAP) else {
        return Ok(());
    };
    let raw = column.cast(&DataType::Float64)?;
    let billions: Vec<Option<f64>> = raw
        .f64()?
        .into_iter()
        .map(|v| v.and_then(market_cap_billions))
        .collect();
    df.with_column(Column::new(MARKET_CAP.into(), billions))?;
    Ok(())
}
