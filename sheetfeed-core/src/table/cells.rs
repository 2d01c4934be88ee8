//! Export a table as a grid of JSON cell values (header row first).
//!
//! Nulls and non-finite floats become empty strings so the worksheet shows a
//! blank cell; numbers stay numeric, text stays text.

use crate::data::provider::DataError;
use polars::prelude::*;
use serde_json::{Number, Value};

fn blank() -> Value {
    Value::String(String::new())
}

/// Header row of column names followed by every row, in table order.
pub fn to_value_grid(df: &DataFrame) -> Result<Vec<Vec<Value>>, DataError> {
    let header: Vec<Value> = df
        .get_column_names()
        .iter()
        .map(|name| Value::String(name.to_string()))
        .collect();

    let columns = df
        .get_columns()
        .iter()
        .map(column_values)
        .collect::<Result<Vec<_>, _>>()?;

    let mut grid = Vec::with_capacity(df.height() + 1);
    grid.push(header);
    for row in 0..df.height() {
        grid.push(
            columns
                .iter()
                .map(|values| values.get(row).cloned().unwrap_or_else(blank))
                .collect(),
        );
    }
    Ok(grid)
}

fn column_values(column: &Column) -> Result<Vec<Value>, DataError> {
    let values = match column.dtype() {
        DataType::Float32 | DataType::Float64 => column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.and_then(Number::from_f64).map(Value::Number).unwrap_or_else(blank))
            .collect(),
        DataType::UInt32 | DataType::UInt64 => column
            .cast(&DataType::UInt64)?
            .u64()?
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or_else(blank))
            .collect(),
        DataType::Int32 | DataType::Int64 => column
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(Value::from).unwrap_or_else(blank))
            .collect(),
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|v| v.map(Value::Bool).unwrap_or_else(blank))
            .collect(),
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.map(|s| Value::String(s.to_string())).unwrap_or_else(blank))
            .collect(),
        _ => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| Value::String(s.to_string())).unwrap_or_else(blank))
            .collect(),
    };
    Ok(values)
}
