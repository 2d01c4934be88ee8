//! Per-ticker fetch with bounded retry and fundamentals degradation.
//!
//! Tickers are processed one at a time in configured order. Each ticker ends
//! in exactly one [`TickerOutcome`]; nothing a single ticker does can abort the
//! run. Whether an empty collection is fatal is the caller's decision.

use crate::config::{
    Interval, Period, FUNDAMENTAL_FIELDS, INTERVAL, MAX_TRIES, PERIOD, RETRY_BACKOFF,
    STRIPPED_SUFFIXES, TICKERS,
};
use crate::data::{DataError, MarketDataProvider};
use crate::domain::{FundamentalField, Fundamentals};
use crate::table::{attach_fundamentals, concat_tables, normalize_bars};
use polars::prelude::DataFrame;
use std::time::Duration;
use tracing::{error, info, warn};

/// Everything the collector needs to know, normally the compile-time constants.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    pub tickers: Vec<String>,
    pub period: Period,
    pub interval: Interval,
    /// Bar-series attempts per ticker (at least one attempt is always made).
    pub max_tries: u32,
    pub retry_backoff: Duration,
    pub fundamental_fields: Vec<FundamentalField>,
    pub stripped_suffixes: Vec<String>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            tickers: TICKERS.iter().map(|t| t.to_string()).collect(),
            period: PERIOD,
            interval: INTERVAL,
            max_tries: MAX_TRIES,
            retry_backoff: RETRY_BACKOFF,
            fundamental_fields: FUNDAMENTAL_FIELDS.to_vec(),
            stripped_suffixes: STRIPPED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// How a single ticker ended.
#[derive(Debug)]
pub enum TickerOutcome {
    /// Non-empty table, fundamentals attached (possibly all null).
    Collected(DataFrame),
    /// The provider returned no bars. Not retried.
    Empty,
    /// Every attempt failed; `error` is the last one seen.
    Failed { attempts: u32, error: DataError },
}

impl TickerOutcome {
    pub fn rows(&self) -> usize {
        match self {
            TickerOutcome::Collected(table) => table.height(),
            _ => 0,
        }
    }
}

/// Per-ticker outcomes of one collection pass, in configured order.
#[derive(Debug, Default)]
pub struct Collection {
    pub outcomes: Vec<(String, TickerOutcome)>,
}

impl Collection {
    pub fn collected(&self) -> usize {
        self.count(|o| matches!(o, TickerOutcome::Collected(_)))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, TickerOutcome::Empty))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TickerOutcome::Failed { .. }))
    }

    pub fn total_rows(&self) -> usize {
        self.outcomes.iter().map(|(_, o)| o.rows()).sum()
    }

    fn count(&self, pred: impl Fn(&TickerOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    /// Concatenate the collected tables in ticker order.
    ///
    /// `None` when no ticker produced a table.
    pub fn into_table(self) -> Result<Option<DataFrame>, DataError> {
        let tables: Vec<DataFrame> = self
            .outcomes
            .into_iter()
            .filter_map(|(_, outcome)| match outcome {
                TickerOutcome::Collected(table) => Some(table),
                _ => None,
            })
            .collect();
        concat_tables(tables)
    }
}

/// Drives a [`MarketDataProvider`] across the configured tickers.
pub struct Collector<'a> {
    provider: &'a dyn MarketDataProvider,
    settings: CollectorSettings,
}

impl<'a> Collector<'a> {
    pub fn new(provider: &'a dyn MarketDataProvider, settings: CollectorSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Fetch every configured ticker, strictly in order.
    pub fn collect(&self) -> Collection {
        let total = self.settings.tickers.len();
        let mut collection = Collection::default();

        for (i, ticker) in self.settings.tickers.iter().enumerate() {
            info!("[{}/{}] fetching {ticker} via {}", i + 1, total, self.provider.name());
            let outcome = self.fetch(ticker);
            collection.outcomes.push((ticker.clone(), outcome));
        }

        info!(
            collected = collection.collected(),
            empty = collection.empty(),
            failed = collection.failed(),
            rows = collection.total_rows(),
            "collection complete: {}/{total} tickers produced rows",
            collection.collected()
        );
        collection
    }

    /// Fetch one ticker with bounded retry.
    ///
    /// An empty series ends the ticker immediately without consuming a retry.
    /// Any error consumes one attempt and, unless it was the last, sleeps the
    /// fixed backoff before trying again.
    pub fn fetch(&self, ticker: &str) -> TickerOutcome {
        let max_tries = self.settings.max_tries.max(1);
        let mut last_error = None;

        for attempt in 1..=max_tries {
            match self.attempt(ticker) {
                Ok(Some(table)) => {
                    info!(ticker, rows = table.height(), "collected");
                    return TickerOutcome::Collected(table);
                }
                Ok(None) => {
                    warn!(ticker, "no data returned");
                    return TickerOutcome::Empty;
                }
                Err(e) => {
                    warn!(ticker, attempt, max_tries, error = %e, "download failed (attempt {attempt}/{max_tries})");
                    last_error = Some(e);
                    if attempt < max_tries {
                        std::thread::sleep(self.settings.retry_backoff);
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into()));
        error!(ticker, attempts = max_tries, error = %error, "failed to download after {max_tries} attempts");
        TickerOutcome::Failed {
            attempts: max_tries,
            error,
        }
    }

    /// One attempt: bars -> rows -> snapshot -> table. `Ok(None)` means no data.
    fn attempt(&self, ticker: &str) -> Result<Option<DataFrame>, DataError> {
        let source =
            self.provider
                .fetch_bars(ticker, self.settings.period, self.settings.interval)?;
        if source.height() == 0 {
            return Ok(None);
        }

        let suffixes: Vec<&str> = self
            .settings
            .stripped_suffixes
            .iter()
            .map(String::as_str)
            .collect();
        let rows = normalize_bars(source, ticker, &suffixes)?;
        let fundamentals = self.fundamentals(ticker);
        let table = attach_fundamentals(rows, &fundamentals, &self.settings.fundamental_fields)?;
        Ok(Some(table))
    }

    /// Single-shot snapshot fetch; failures degrade to an all-null snapshot.
    fn fundamentals(&self, ticker: &str) -> Fundamentals {
        match self.provider.fetch_fundamentals(ticker) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(ticker, error = %e, "fundamentals unavailable, columns left empty");
                Fundamentals::default()
            }
        }
    }
}
