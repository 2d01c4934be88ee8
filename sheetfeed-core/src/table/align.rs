//! Concatenate per-ticker tables into the final table.
//!
//! Tables normally share a column set, but a ticker whose source omitted a
//! series (e.g. no volume) lacks that column. The result carries the union of
//! columns in first-seen order; rows from a table without a column get nulls.

use crate::data::provider::DataError;
use polars::prelude::*;

/// Ordered concatenation of `tables`. `None` when there is nothing to concatenate.
pub fn concat_tables(tables: Vec<DataFrame>) -> Result<Option<DataFrame>, DataError> {
    if tables.is_empty() {
        return Ok(None);
    }

    // Union of columns, first-seen order, first-seen dtype
    let mut schema: Vec<(PlSmallStr, DataType)> = Vec::new();
    for table in &tables {
        for column in table.get_columns() {
            if !schema.iter().any(|(name, _)| name == column.name()) {
                schema.push((column.name().clone(), column.dtype().clone()));
            }
        }
    }

    let mut combined: Option<DataFrame> = None;
    for table in &tables {
        let aligned = align_to(table, &schema)?;
        match combined.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&aligned)?;
            }
            None => combined = Some(aligned),
        }
    }

    Ok(combined)
}

/// Reorder `table` to `schema`, adding null columns for anything it lacks.
fn align_to(table: &DataFrame, schema: &[(PlSmallStr, DataType)]) -> Result<DataFrame, DataError> {
    let height = table.height();
    let columns = schema
        .iter()
        .map(|(name, dtype)| match table.column(name.as_str()) {
            Ok(column) => column.cast(dtype),
            Err(_) => Ok(Column::from(Series::full_null(name.clone(), height, dtype))),
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    Ok(DataFrame::new(columns)?)
}
