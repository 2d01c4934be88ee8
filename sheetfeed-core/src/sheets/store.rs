//! Spreadsheet store trait and structured error types.
//!
//! The SpreadsheetStore trait is the narrow surface the publisher needs from
//! a remote tabular store: open by id, find a worksheet by title, clear it,
//! bulk-write values.

use serde_json::Value;
use thiserror::Error;

/// Structured error types for spreadsheet operations. All are fatal for a run.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("token exchange failed: {0}")]
    Auth(String),

    #[error("not authorized to access spreadsheet '{spreadsheet_id}'")]
    Unauthorized { spreadsheet_id: String },

    #[error("spreadsheet not found: {spreadsheet_id}")]
    SpreadsheetNotFound { spreadsheet_id: String },

    #[error("worksheet '{title}' not found in spreadsheet '{spreadsheet_id}'")]
    WorksheetNotFound {
        spreadsheet_id: String,
        title: String,
    },

    #[error("sheets API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("table export failed: {0}")]
    Table(String),
}

/// One worksheet (tab) of a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetRef {
    pub spreadsheet_id: String,
    pub sheet_id: i64,
    pub title: String,
}

/// Metadata of an opened spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spreadsheet {
    pub id: String,
    pub title: String,
    pub worksheets: Vec<WorksheetRef>,
}

impl Spreadsheet {
    /// Look up a worksheet by its exact title.
    pub fn worksheet(&self, title: &str) -> Result<WorksheetRef, SheetsError> {
        self.worksheets
            .iter()
            .find(|ws| ws.title == title)
            .cloned()
            .ok_or_else(|| SheetsError::WorksheetNotFound {
                spreadsheet_id: self.id.clone(),
                title: title.to_string(),
            })
    }
}

/// Remote tabular store.
pub trait SpreadsheetStore: Send + Sync {
    /// Open a spreadsheet by id and list its worksheets.
    fn open(&self, spreadsheet_id: &str) -> Result<Spreadsheet, SheetsError>;

    /// Remove every value from the worksheet.
    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), SheetsError>;

    /// Write `rows` as a block whose top-left cell is `anchor` (A1 notation).
    ///
    /// Returns the number of rows the store reports as updated.
    fn write(
        &self,
        worksheet: &WorksheetRef,
        anchor: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<usize, SheetsError>;
}

/// Quote a worksheet title for use in an A1 range (`'It''s'`).
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// A1 range for `anchor` on `worksheet`, e.g. `'Sheet1'!A1`.
pub fn a1_range(worksheet: &WorksheetRef, anchor: &str) -> String {
    format!("{}!{anchor}", quote_title(&worksheet.title))
}
