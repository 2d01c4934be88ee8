//! Clear-then-write publisher for one worksheet.
//!
//! The worksheet is cleared before the new grid is written, so stale rows
//! from a longer previous run never survive. The two calls are not atomic: a
//! failed write leaves the worksheet empty.

use crate::config::{SHEET_ID, WORKSHEET, WRITE_ANCHOR};
use crate::sheets::{SheetsError, SpreadsheetStore};
use crate::table::to_value_grid;
use polars::prelude::DataFrame;
use tracing::{error, info};

/// Where the table goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub spreadsheet_id: String,
    pub worksheet: String,
    /// Top-left cell of the written block.
    pub anchor: String,
}

impl Default for PublishTarget {
    fn default() -> Self {
        Self {
            spreadsheet_id: SHEET_ID.to_string(),
            worksheet: WORKSHEET.to_string(),
            anchor: WRITE_ANCHOR.to_string(),
        }
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Data rows written, header excluded.
    pub rows: usize,
    pub spreadsheet_id: String,
    pub worksheet: String,
}

impl PublishReport {
    /// The line printed on success.
    pub fn summary(&self) -> String {
        format!(
            "{} rows updated in '{}' (Sheet ID: {})",
            self.rows, self.worksheet, self.spreadsheet_id
        )
    }
}

pub struct Publisher<'a> {
    store: &'a dyn SpreadsheetStore,
    target: PublishTarget,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn SpreadsheetStore, target: PublishTarget) -> Self {
        Self { store, target }
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    /// Replace the worksheet's contents with `table` (header row first).
    pub fn publish(&self, table: &DataFrame) -> Result<PublishReport, SheetsError> {
        self.replace(table).inspect_err(|e| {
            error!(
                spreadsheet_id = %self.target.spreadsheet_id,
                worksheet = %self.target.worksheet,
                error = %e,
                "publish failed"
            );
        })
    }

    fn replace(&self, table: &DataFrame) -> Result<PublishReport, SheetsError> {
        let target = &self.target;
        let spreadsheet = self.store.open(&target.spreadsheet_id)?;
        let worksheet = spreadsheet.worksheet(&target.worksheet)?;

        // Build the grid before clearing so an export failure leaves the sheet intact.
        let grid = to_value_grid(table).map_err(|e| SheetsError::Table(e.to_string()))?;

        self.store.clear(&worksheet)?;
        let written = self.store.write(&worksheet, &target.anchor, grid)?;

        let report = PublishReport {
            rows: table.height(),
            spreadsheet_id: spreadsheet.id,
            worksheet: worksheet.title,
        };
        info!(
            rows = report.rows,
            reported = written,
            worksheet = %report.worksheet,
            spreadsheet_id = %report.spreadsheet_id,
            "worksheet updated"
        );
        Ok(report)
    }
}
