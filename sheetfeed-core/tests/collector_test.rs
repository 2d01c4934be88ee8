//! Integration tests for the collector: retry bounds, empty-series handling,
//! fundamentals degradation and the shape of the produced tables.

mod common;

use common::{
    close_only_frame, full_snapshot, settings, ticker_labelled_frame, BarScript,
    ScriptedProvider, SnapshotScript,
};
use polars::prelude::*;
use sheetfeed_core::domain::Fundamentals;
use sheetfeed_core::{Collector, TickerOutcome};
use std::time::{Duration, Instant};

fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

const FULL_ORDER: [&str; 16] = [
    "Ticker",
    "date_time",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "sector",
    "industry",
    "longName",
    "country",
    "currency",
    "marketCap",
    "dividendYield",
    "symbol",
    "shortName",
];

#[test]
fn rows_match_series_and_share_one_snapshot() {
    let provider = ScriptedProvider::new()
        .bars("BOVA11.SA", BarScript::Rows(7))
        .snapshot("BOVA11.SA", SnapshotScript::Snapshot(full_snapshot()));
    let collector = Collector::new(&provider, settings(&["BOVA11.SA"]));

    let TickerOutcome::Collected(table) = collector.fetch("BOVA11.SA") else {
        panic!("expected a collected table");
    };

    assert_eq!(table.height(), 7);
    assert_eq!(names(&table), FULL_ORDER);
    assert_eq!(provider.bar_calls("BOVA11.SA"), 1);
    assert_eq!(provider.snapshot_calls("BOVA11.SA"), 1);

    let tickers = table.column("Ticker").unwrap();
    assert!(tickers.str().unwrap().into_iter().all(|t| t == Some("BOVA11")));

    let sectors = table.column("sector").unwrap();
    assert!(sectors
        .str()
        .unwrap()
        .into_iter()
        .all(|s| s == Some("Financial Services")));

    let caps = table.column("marketCap").unwrap();
    assert!(caps.f64().unwrap().into_iter().all(|c| c == Some(2.5)));

    // The snapshot's own symbol keeps its suffix; only the Ticker column is stripped.
    let symbols = table.column("symbol").unwrap();
    assert_eq!(symbols.str().unwrap().get(0), Some("BOVA11.SA"));
}

#[test]
fn timestamps_are_formatted_to_the_minute() {
    let provider = ScriptedProvider::new().bars("BTC-USD", BarScript::Rows(2));
    let collector = Collector::new(&provider, settings(&["BTC-USD"]));

    let TickerOutcome::Collected(table) = collector.fetch("BTC-USD") else {
        panic!("expected a collected table");
    };
    let stamps = table.column("date_time").unwrap();
    let stamps = stamps.str().unwrap();
    assert_eq!(stamps.get(0), Some("2024-01-02 10:00"));
    assert_eq!(stamps.get(1), Some("2024-01-02 11:00"));
}

#[test]
fn always_failing_ticker_uses_every_attempt() {
    let provider = ScriptedProvider::new().bars("BOVA11.SA", BarScript::AlwaysFail);
    let collector = Collector::new(&provider, settings(&["BOVA11.SA"]));

    let outcome = collector.fetch("BOVA11.SA");

    assert_eq!(provider.bar_calls("BOVA11.SA"), 3);
    assert_eq!(provider.snapshot_calls("BOVA11.SA"), 0);
    assert_eq!(outcome.rows(), 0);
    assert!(matches!(outcome, TickerOutcome::Failed { attempts: 3, .. }));
}

#[test]
fn empty_series_is_not_retried() {
    let provider = ScriptedProvider::new().bars("BOVA11.SA", BarScript::Empty);
    let collector = Collector::new(&provider, settings(&["BOVA11.SA"]));

    let outcome = collector.fetch("BOVA11.SA");

    assert!(matches!(outcome, TickerOutcome::Empty));
    assert_eq!(provider.bar_calls("BOVA11.SA"), 1);
    assert_eq!(provider.snapshot_calls("BOVA11.SA"), 0);
}

#[test]
fn transient_failures_recover_within_the_bound() {
    let provider = ScriptedProvider::new().bars(
        "BTC-USD",
        BarScript::FailThenRows {
            failures: 2,
            rows: 5,
        },
    );
    let collector = Collector::new(&provider, settings(&["BTC-USD"]));

    let outcome = collector.fetch("BTC-USD");

    assert_eq!(provider.bar_calls("BTC-USD"), 3);
    assert_eq!(outcome.rows(), 5);
}

#[test]
fn zero_max_tries_still_attempts_once() {
    let provider = ScriptedProvider::new().bars("BTC-USD", BarScript::AlwaysFail);
    let mut settings = settings(&["BTC-USD"]);
    settings.max_tries = 0;
    let collector = Collector::new(&provider, settings);

    let outcome = collector.fetch("BTC-USD");

    assert_eq!(provider.bar_calls("BTC-USD"), 1);
    assert!(matches!(outcome, TickerOutcome::Failed { attempts: 1, .. }));
}

#[test]
fn failed_snapshot_leaves_fundamentals_null() {
    let provider = ScriptedProvider::new()
        .bars("BOVA11.SA", BarScript::Rows(4))
        .snapshot("BOVA11.SA", SnapshotScript::Fail);
    let collector = Collector::new(&provider, settings(&["BOVA11.SA"]));

    let TickerOutcome::Collected(table) = collector.fetch("BOVA11.SA") else {
        panic!("snapshot failure must not drop the ticker");
    };

    assert_eq!(table.height(), 4);
    assert_eq!(names(&table), FULL_ORDER);
    for field in &FULL_ORDER[7..] {
        assert_eq!(table.column(field).unwrap().null_count(), 4, "{field}");
    }
    // Not retried: the snapshot is single-shot.
    assert_eq!(provider.snapshot_calls("BOVA11.SA"), 1);
}

#[test]
fn missing_dividend_yield_is_null_not_zero() {
    let snapshot = Fundamentals {
        dividend_yield: None,
        market_cap: None,
        ..full_snapshot()
    };
    let provider = ScriptedProvider::new()
        .bars("BOVA11.SA", BarScript::Rows(3))
        .snapshot("BOVA11.SA", SnapshotScript::Snapshot(snapshot));
    let collector = Collector::new(&provider, settings(&["BOVA11.SA"]));

    let TickerOutcome::Collected(table) = collector.fetch("BOVA11.SA") else {
        panic!("expected a collected table");
    };

    assert_eq!(table.column("dividendYield").unwrap().null_count(), 3);
    assert_eq!(table.column("marketCap").unwrap().null_count(), 3);
    assert_eq!(table.column("sector").unwrap().null_count(), 0);
}

#[test]
fn absent_source_columns_are_not_invented() {
    let provider = ScriptedProvider::new().bars("BTC-USD", BarScript::Frame(close_only_frame(2)));
    let collector = Collector::new(&provider, settings(&["BTC-USD"]));

    let TickerOutcome::Collected(table) = collector.fetch("BTC-USD") else {
        panic!("expected a collected table");
    };

    let mut expected = vec!["Ticker", "date_time", "close"];
    expected.extend_from_slice(&FULL_ORDER[7..]);
    assert_eq!(names(&table), expected);
}

#[test]
fn collection_keeps_configured_order_and_counts_outcomes() {
    let provider = ScriptedProvider::new()
        .bars("BOVA11.SA", BarScript::Rows(3))
        .bars("DEAD", BarScript::AlwaysFail)
        .bars("NONE", BarScript::Empty)
        .bars("BTC-USD", BarScript::Rows(2));
    let collector = Collector::new(&provider, settings(&["BOVA11.SA", "DEAD", "NONE", "BTC-USD"]));

    let collection = collector.collect();

    let order: Vec<&str> = collection.outcomes.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(order, vec!["BOVA11.SA", "DEAD", "NONE", "BTC-USD"]);
    assert_eq!(collection.collected(), 2);
    assert_eq!(collection.failed(), 1);
    assert_eq!(collection.empty(), 1);
    assert_eq!(collection.total_rows(), 5);

    let table = collection.into_table().unwrap().unwrap();
    assert_eq!(table.height(), 5);
    let tickers: Vec<Option<&str>> = table.column("Ticker").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(
        tickers,
        vec![
            Some("BOVA11"),
            Some("BOVA11"),
            Some("BOVA11"),
            Some("BTC-USD"),
            Some("BTC-USD")
        ]
    );
}

#[test]
fn mixed_column_sets_are_aligned_by_name() {
    let provider = ScriptedProvider::new()
        .bars("BTC-USD", BarScript::Frame(close_only_frame(2)))
        .bars("BOVA11.SA", BarScript::Rows(1));
    let collector = Collector::new(&provider, settings(&["BTC-USD", "BOVA11.SA"]));

    let table = collector.collect().into_table().unwrap().unwrap();

    assert_eq!(table.height(), 3);
    assert_eq!(table.width(), FULL_ORDER.len());
    // Close-only rows carry nulls where the other ticker supplied open.
    assert_eq!(table.column("open").unwrap().null_count(), 2);
    assert_eq!(table.column("close").unwrap().null_count(), 0);
}

#[test]
fn ticker_labelled_columns_are_collected_on_the_first_attempt() {
    let provider = ScriptedProvider::new()
        .bars("BOVA11.SA", BarScript::Frame(ticker_labelled_frame("BOVA11.SA", 3)))
        .snapshot("BOVA11.SA", SnapshotScript::Snapshot(full_snapshot()));
    let collector = Collector::new(&provider, settings(&["BOVA11.SA"]));

    let TickerOutcome::Collected(table) = collector.fetch("BOVA11.SA") else {
        panic!("labelled columns must flatten, not fail the attempt");
    };

    assert_eq!(provider.bar_calls("BOVA11.SA"), 1);
    assert_eq!(table.height(), 3);
    assert_eq!(names(&table), FULL_ORDER);
}

#[test]
fn backoff_separates_attempts_but_does_not_follow_the_last() {
    let backoff = Duration::from_millis(200);
    let provider = ScriptedProvider::new().bars("BTC-USD", BarScript::AlwaysFail);
    let mut settings = settings(&["BTC-USD"]);
    settings.retry_backoff = backoff;
    let collector = Collector::new(&provider, settings);

    let started = Instant::now();
    let outcome = collector.fetch("BTC-USD");
    let elapsed = started.elapsed();

    assert_eq!(provider.bar_calls("BTC-USD"), 3);
    assert!(matches!(outcome, TickerOutcome::Failed { attempts: 3, .. }));
    // Two pauses between three attempts; a third pause would reach 600 ms.
    assert!(elapsed >= backoff * 2, "elapsed {elapsed:?}");
    assert!(elapsed < backoff * 3, "elapsed {elapsed:?}");
}

#[test]
fn single_attempt_never_sleeps() {
    let provider = ScriptedProvider::new().bars("BTC-USD", BarScript::AlwaysFail);
    let mut settings = settings(&["BTC-USD"]);
    settings.max_tries = 1;
    settings.retry_backoff = Duration::from_secs(5);
    let collector = Collector::new(&provider, settings);

    let started = Instant::now();
    collector.fetch("BTC-USD");

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(provider.bar_calls("BTC-USD"), 1);
}
