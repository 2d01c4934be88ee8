//! Sheetfeed: fetch the configured tickers from Yahoo Finance and overwrite
//! the destination worksheet.
//!
//! Everything is fixed at compile time (see `sheetfeed_core::config`); the
//! only runtime input is `credentials.json` in the working directory and the
//! `RUST_LOG` filter. Exit status is 0 on success and 1 on any fatal error.

use anyhow::{Context, Result};
use sheetfeed_core::config::{CREDENTIALS_PATH, SCOPES};
use sheetfeed_core::data::YahooProvider;
use sheetfeed_core::sheets::{GoogleSheetsClient, ServiceAccountAuth};
use sheetfeed_core::{CollectorSettings, PublishTarget};
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sheetfeed=info,sheetfeed_core=info";

fn main() -> Result<()> {
    init_logging();

    let auth = ServiceAccountAuth::from_file(Path::new(CREDENTIALS_PATH), SCOPES)
        .with_context(|| format!("failed to load credentials from {CREDENTIALS_PATH}"))?;
    tracing::info!(client_email = auth.client_email(), "credentials loaded");

    let provider = YahooProvider::new().context("failed to create Yahoo provider")?;
    let store = GoogleSheetsClient::new(auth).context("failed to create Sheets client")?;

    let report = sheetfeed_core::run(
        &provider,
        &store,
        CollectorSettings::default(),
        PublishTarget::default(),
    )?;

    println!("{}", report.summary());
    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
