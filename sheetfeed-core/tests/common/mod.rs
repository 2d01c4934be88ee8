//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use polars::prelude::*;
use serde_json::Value;
use sheetfeed_core::config::{Interval, Period};
use sheetfeed_core::data::{DataError, MarketDataProvider};
use sheetfeed_core::domain::Fundamentals;
use sheetfeed_core::sheets::{SheetsError, Spreadsheet, SpreadsheetStore, WorksheetRef};
use sheetfeed_core::{CollectorSettings, PublishTarget};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

// ──────────────────────────────────────────────
// Source frames
// ──────────────────────────────────────────────

/// 2024-01-02 10:00 exchange time, in epoch milliseconds.
pub const FIRST_BAR_MS: i64 = 1_704_189_600_000;
const HOUR_MS: i64 = 3_600_000;

/// An hourly source frame with `n` bars and the full set of provider labels.
pub fn hourly_frame(n: usize) -> DataFrame {
    let times: Vec<i64> = (0..n as i64).map(|i| FIRST_BAR_MS + i * HOUR_MS).collect();
    let close: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    DataFrame::new(vec![
        Column::new("Datetime".into(), times)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap(),
        Column::new("Open".into(), close.iter().map(|c| c - 0.5).collect::<Vec<_>>()),
        Column::new("High".into(), close.iter().map(|c| c + 1.0).collect::<Vec<_>>()),
        Column::new("Low".into(), close.iter().map(|c| c - 1.0).collect::<Vec<_>>()),
        Column::new("Close".into(), close.clone()),
        Column::new("Adj Close".into(), close),
        Column::new("Volume".into(), vec![1_000u64; n]),
    ])
    .unwrap()
}

/// A frame that only carries a timestamp and a close column.
pub fn close_only_frame(n: usize) -> DataFrame {
    let times: Vec<i64> = (0..n as i64).map(|i| FIRST_BAR_MS + i * HOUR_MS).collect();
    DataFrame::new(vec![
        Column::new("Datetime".into(), times)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap(),
        Column::new("Close".into(), vec![42.0; n]),
    ])
    .unwrap()
}

/// An hourly frame whose labels were renamed to `TICKER|Field` after
/// construction, the way a multi-ticker download labels its columns.
pub fn ticker_labelled_frame(ticker: &str, n: usize) -> DataFrame {
    let mut df = hourly_frame(n);
    for label in ["Open", "High", "Low", "Close", "Adj Close", "Volume"] {
        df.rename(label, format!("{ticker}|{label}").into()).unwrap();
    }
    df
}

pub fn full_snapshot() -> Fundamentals {
    Fundamentals {
        sector: Some("Financial Services".into()),
        industry: Some("Asset Management".into()),
        long_name: Some("iShares Ibovespa Fundo de Índice".into()),
        country: Some("Brazil".into()),
        currency: Some("BRL".into()),
        market_cap: Some(2_500_000_000.0),
        dividend_yield: Some(0.0123),
        symbol: Some("BOVA11.SA".into()),
        short_name: Some("ISHARES BOVA".into()),
    }
}

// ──────────────────────────────────────────────
// Scripted provider
// ──────────────────────────────────────────────

/// What the bar endpoint does for one ticker.
#[derive(Debug, Clone)]
pub enum BarScript {
    /// Hourly frame with this many bars.
    Rows(usize),
    /// A frame supplied verbatim.
    Frame(DataFrame),
    /// Zero rows.
    Empty,
    /// Every call fails.
    AlwaysFail,
    /// The first `failures` calls fail, then `rows` bars.
    FailThenRows { failures: usize, rows: usize },
}

#[derive(Debug, Clone)]
pub enum SnapshotScript {
    Snapshot(Fundamentals),
    Fail,
}

#[derive(Default)]
pub struct ScriptedProvider {
    bars: HashMap<String, BarScript>,
    snapshots: HashMap<String, SnapshotScript>,
    bar_calls: Mutex<HashMap<String, usize>>,
    snapshot_calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bars(mut self, ticker: &str, script: BarScript) -> Self {
        self.bars.insert(ticker.to_string(), script);
        self
    }

    pub fn snapshot(mut self, ticker: &str, script: SnapshotScript) -> Self {
        self.snapshots.insert(ticker.to_string(), script);
        self
    }

    pub fn bar_calls(&self, ticker: &str) -> usize {
        self.bar_calls.lock().unwrap().get(ticker).copied().unwrap_or(0)
    }

    pub fn snapshot_calls(&self, ticker: &str) -> usize {
        self.snapshot_calls
            .lock()
            .unwrap()
            .get(ticker)
            .copied()
            .unwrap_or(0)
    }
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_bars(
        &self,
        ticker: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<DataFrame, DataError> {
        let call = {
            let mut calls = self.bar_calls.lock().unwrap();
            let count = calls.entry(ticker.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        match self.bars.get(ticker).cloned().unwrap_or(BarScript::Empty) {
            BarScript::Rows(n) => Ok(hourly_frame(n)),
            BarScript::Frame(df) => Ok(df),
            BarScript::Empty => Ok(DataFrame::empty()),
            BarScript::AlwaysFail => Err(DataError::NetworkUnreachable("connection reset".into())),
            BarScript::FailThenRows { failures, rows } => {
                if call <= failures {
                    Err(DataError::RateLimited {
                        retry_after_secs: 1,
                    })
                } else {
                    Ok(hourly_frame(rows))
                }
            }
        }
    }

    fn fetch_fundamentals(&self, ticker: &str) -> Result<Fundamentals, DataError> {
        *self
            .snapshot_calls
            .lock()
            .unwrap()
            .entry(ticker.to_string())
            .or_insert(0) += 1;

        match self.snapshots.get(ticker) {
            Some(SnapshotScript::Snapshot(f)) => Ok(f.clone()),
            Some(SnapshotScript::Fail) => Err(DataError::AuthenticationRequired("no crumb".into())),
            None => Ok(Fundamentals::default()),
        }
    }
}

pub fn settings(tickers: &[&str]) -> CollectorSettings {
    CollectorSettings {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        retry_backoff: Duration::ZERO,
        ..CollectorSettings::default()
    }
}

// ──────────────────────────────────────────────
// In-memory spreadsheet
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Open(String),
    Clear(String),
    Write { title: String, anchor: String, rows: usize },
}

pub struct MemoryStore {
    id: String,
    titles: Vec<String>,
    pub fail_write: bool,
    calls: Mutex<Vec<StoreCall>>,
    contents: Mutex<HashMap<String, Vec<Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new(id: &str, titles: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            titles: titles.iter().map(|t| t.to_string()).collect(),
            fail_write: false,
            calls: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
        }
    }

    /// Pre-populate a worksheet, as if a previous run had written it.
    pub fn seed(&self, title: &str, rows: Vec<Vec<Value>>) {
        self.contents.lock().unwrap().insert(title.to_string(), rows);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn contents(&self, title: &str) -> Vec<Vec<Value>> {
        self.contents
            .lock()
            .unwrap()
            .get(title)
            .cloned()
            .unwrap_or_default()
    }
}

impl SpreadsheetStore for MemoryStore {
    fn open(&self, spreadsheet_id: &str) -> Result<Spreadsheet, SheetsError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Open(spreadsheet_id.to_string()));
        if spreadsheet_id != self.id {
            return Err(SheetsError::SpreadsheetNotFound {
                spreadsheet_id: spreadsheet_id.to_string(),
            });
        }
        Ok(Spreadsheet {
            id: self.id.clone(),
            title: "Prices".into(),
            worksheets: self
                .titles
                .iter()
                .enumerate()
                .map(|(i, title)| WorksheetRef {
                    spreadsheet_id: self.id.clone(),
                    sheet_id: i as i64,
                    title: title.clone(),
                })
                .collect(),
        })
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), SheetsError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Clear(worksheet.title.clone()));
        self.contents.lock().unwrap().remove(&worksheet.title);
        Ok(())
    }

    fn write(
        &self,
        worksheet: &WorksheetRef,
        anchor: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<usize, SheetsError> {
        self.calls.lock().unwrap().push(StoreCall::Write {
            title: worksheet.title.clone(),
            anchor: anchor.to_string(),
            rows: rows.len(),
        });
        if self.fail_write {
            return Err(SheetsError::Api {
                status: 500,
                message: "backend error".into(),
            });
        }
        let written = rows.len();
        self.contents
            .lock()
            .unwrap()
            .insert(worksheet.title.clone(), rows);
        Ok(written)
    }
}

pub fn target(spreadsheet_id: &str, worksheet: &str) -> PublishTarget {
    PublishTarget {
        spreadsheet_id: spreadsheet_id.to_string(),
        worksheet: worksheet.to_string(),
        anchor: "A1".into(),
    }
}
