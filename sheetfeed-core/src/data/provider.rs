//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over the quote source so the
//! collector can be driven by Yahoo Finance in production and by scripted
//! fakes in tests.

use crate::config::{Interval, Period};
use crate::domain::Fundamentals;
use polars::prelude::{DataFrame, PolarsError};
use thiserror::Error;

/// Source-frame label for intraday timestamps.
pub const LABEL_DATETIME: &str = "Datetime";
/// Source-frame label for daily (and longer) timestamps.
pub const LABEL_DATE: &str = "Date";
pub const LABEL_OPEN: &str = "Open";
pub const LABEL_HIGH: &str = "High";
pub const LABEL_LOW: &str = "Low";
pub const LABEL_CLOSE: &str = "Close";
pub const LABEL_ADJ_CLOSE: &str = "Adj Close";
pub const LABEL_VOLUME: &str = "Volume";

/// Separator between levels of a hierarchical column label (`outer|inner`).
pub const LABEL_LEVEL_SEPARATOR: char = '|';

/// Structured error types for market data operations.
///
/// Every variant is transient from the collector's point of view: it retries
/// the bar series and degrades the fundamentals snapshot.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("HTTP {status} for {ticker}")]
    Http { status: u16, ticker: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("frame error: {0}")]
    Frame(String),

    #[error("data error: {0}")]
    Other(String),
}

impl From<PolarsError> for DataError {
    fn from(e: PolarsError) -> Self {
        DataError::Frame(e.to_string())
    }
}

/// Trait for market data sources.
///
/// Implementations make a single attempt per call; retry policy belongs to
/// the collector.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the bar series for `ticker` over `period` sampled at `interval`.
    ///
    /// The returned frame uses provider labels: a timestamp column named
    /// [`LABEL_DATETIME`] or [`LABEL_DATE`] holding exchange-local wall-clock
    /// time, and whichever of the price/volume columns the source supplied.
    /// Labels may be hierarchical (`outer|inner`). A frame with zero rows
    /// means the provider has no data for the ticker.
    fn fetch_bars(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<DataFrame, DataError>;

    /// Fetch the descriptive/fundamental snapshot for `ticker`.
    fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, DataError>;
}
