//! Sheetfeed core: collector, table reshaping and worksheet publisher.
//!
//! This crate contains everything the scheduled job does:
//! - Compile-time configuration (tickers, lookback, sampling, destination)
//! - Market data provider trait with a Yahoo Finance implementation
//! - Per-ticker fetch with bounded retry and fundamentals degradation
//! - Reshaping provider frames into the flat row table (polars)
//! - Spreadsheet store trait with a Google Sheets implementation
//! - Clear-then-write publisher and the end-to-end pipeline

pub mod collector;
pub mod config;
pub mod data;
pub mod domain;
pub mod pipeline;
pub mod publisher;
pub mod sheets;
pub mod table;

pub use collector::{Collection, Collector, CollectorSettings, TickerOutcome};
pub use pipeline::{run, PipelineError};
pub use publisher::{PublishReport, PublishTarget, Publisher};
