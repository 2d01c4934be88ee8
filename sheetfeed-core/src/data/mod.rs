//! Market data: provider trait and the Yahoo Finance implementation.

pub mod provider;
pub mod quote_summary;
pub mod yahoo;

pub use provider::{DataError, MarketDataProvider};
pub use yahoo::{YahooEndpoints, YahooProvider};
