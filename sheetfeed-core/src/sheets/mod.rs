//! Remote spreadsheet access: the store trait, service-account auth, and the
//! Google Sheets v4 client.

pub mod auth;
pub mod client;
pub mod store;

pub use auth::{ServiceAccountAuth, ServiceAccountKey};
pub use client::GoogleSheetsClient;
pub use store::{a1_range, quote_title, SheetsError, Spreadsheet, SpreadsheetStore, WorksheetRef};
