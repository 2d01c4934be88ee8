//! Compile-time configuration.
//!
//! The job runs unattended with no flags and no config file; everything it
//! needs to know is fixed here and gathered into [`CollectorSettings`] and
//! [`PublishTarget`] at startup.
//!
//! [`CollectorSettings`]: crate::collector::CollectorSettings
//! [`PublishTarget`]: crate::publisher::PublishTarget

use crate::domain::FundamentalField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Tickers to collect, in output order.
pub const TICKERS: &[&str] = &["BOVA11.SA", "BTC-USD"];

/// Lookback window for each bar-series request.
pub const PERIOD: Period = Period::OneDay;

/// Sampling interval of the bar series.
pub const INTERVAL: Interval = Interval::OneHour;

/// Destination spreadsheet.
pub const SHEET_ID: &str = "1D8wlSpiPqu-7F0bvMzLo6EPWH6SfxOzO2E7KlvmX9Pw";

/// Destination worksheet (tab) inside [`SHEET_ID`].
pub const WORKSHEET: &str = "Sheet1";

/// Bar-series fetch attempts per ticker.
pub const MAX_TRIES: u32 = 3;

/// Fixed pause between failed bar-series attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Fundamental attributes broadcast onto every row, in column order.
pub const FUNDAMENTAL_FIELDS: &[FundamentalField] = &[
    FundamentalField::Sector,
    FundamentalField::Industry,
    FundamentalField::LongName,
    FundamentalField::Country,
    FundamentalField::Currency,
    FundamentalField::MarketCap,
    FundamentalField::DividendYield,
    FundamentalField::Symbol,
    FundamentalField::ShortName,
];

/// Exchange suffixes removed from the `Ticker` column.
pub const STRIPPED_SUFFIXES: &[&str] = &[".SA"];

/// Service-account key file, written by the CI runner from a secret.
pub const CREDENTIALS_PATH: &str = "credentials.json";

/// OAuth scopes requested for the service account.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// Top-left cell of the written block (header row included).
pub const WRITE_ANCHOR: &str = "A1";

/// Lookback window understood by the chart endpoint (`range=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bar sampling interval (`interval=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
    OneWeek,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1wk",
        }
    }

    /// Intraday series label their timestamp column `Datetime`, others `Date`.
    pub fn is_intraday(self) -> bool {
        matches!(
            self,
            Interval::FiveMinutes
                | Interval::FifteenMinutes
                | Interval::ThirtyMinutes
                | Interval::OneHour
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
