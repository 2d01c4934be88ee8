//! End-to-end run: collect every ticker, concatenate, publish.

use crate::collector::{Collector, CollectorSettings};
use crate::data::{DataError, MarketDataProvider};
use crate::publisher::{PublishReport, PublishTarget, Publisher};
use crate::sheets::{SheetsError, SpreadsheetStore};
use thiserror::Error;
use tracing::{error, info};

/// The fatal outcomes of a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no data collected for any ticker")]
    NoData,

    #[error("failed to assemble the final table: {0}")]
    Table(#[from] DataError),

    #[error("publish failed: {0}")]
    Publish(#[from] SheetsError),
}

/// Run one collection pass and replace the target worksheet with the result.
///
/// The store is never touched when no ticker produced rows.
pub fn run(
    provider: &dyn MarketDataProvider,
    store: &dyn SpreadsheetStore,
    settings: CollectorSettings,
    target: PublishTarget,
) -> Result<PublishReport, PipelineError> {
    let collection = Collector::new(provider, settings).collect();

    let Some(table) = collection.into_table()? else {
        error!("no data collected for any ticker, nothing published");
        return Err(PipelineError::NoData);
    };
    info!(rows = table.height(), columns = table.width(), "final table assembled");

    let report = Publisher::new(store, target).publish(&table)?;
    Ok(report)
}
