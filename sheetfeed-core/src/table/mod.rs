//! Flat row table: schema, reshaping, concatenation and cell export.
//!
//! A table is a polars `DataFrame` with one row per (ticker, timestamp)
//! observation. Column order is fixed by [`schema`].

pub mod align;
pub mod cells;
pub mod reshape;
pub mod schema;

pub use align::concat_tables;
pub use cells::to_value_grid;
pub use reshape::{attach_fundamentals, market_cap_billions, normalize_bars};
pub use schema::{canonical_columns, project};
