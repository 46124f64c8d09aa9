// src/process/mod.rs
//! Normalization and filtering of a loaded dataset: header cleanup, column
//! role resolution, typed `date_ref`/`status_label`, roster exclusion, and the
//! date window.

pub mod columns;
pub mod date_parser;
pub mod filter;
pub mod records;
pub mod utils;

use crate::config::{DatasetSettings, RangeConfig};
use crate::dataset::ExclusionRoster;
use crate::load;
use anyhow::Result;
use arrow::record_batch::RecordBatch;
use std::path::Path;
use tracing::info;

pub use filter::{filter_by_date, observed_bounds, DateRange};
pub use records::{normalize, NormalizedTable};

/// One dataset after a full pass: the normalized table, the date-filtered
/// view, and the windows involved.
#[derive(Clone, Debug)]
pub struct FilteredDataset {
    pub full: NormalizedTable,
    pub filtered: NormalizedTable,
    /// Min/max of `date_ref`; `None` when no row has a valid date.
    pub observed: Option<DateRange>,
    /// Window actually applied; `None` when filtering was skipped.
    pub applied: Option<DateRange>,
}

/// Fill missing bounds of the requested window from the observed range.
pub fn effective_range(requested: RangeConfig, observed: Option<DateRange>) -> Option<DateRange> {
    let observed = observed?;
    Some(DateRange::new(
        requested.start.unwrap_or(observed.start),
        requested.end.unwrap_or(observed.end),
    ))
}

/// Normalize an already loaded batch.
pub fn normalize_batch(
    batch: &RecordBatch,
    settings: &DatasetSettings,
    roster: &ExclusionRoster,
) -> Result<NormalizedTable> {
    let cleaned = columns::normalize_columns(batch)?;
    normalize(&cleaned, settings.kind, &settings.columns, roster)
}

/// Normalize, then apply the configured (or default) date window.
pub fn process_batch(
    batch: &RecordBatch,
    settings: &DatasetSettings,
    roster: &ExclusionRoster,
) -> Result<FilteredDataset> {
    let full = normalize_batch(batch, settings, roster)?;
    let observed = observed_bounds(&full)?;
    let applied = effective_range(settings.range, observed);
    let filtered = match applied {
        Some(range) => filter_by_date(&full, range)?,
        None => full.clone(),
    };
    info!(
        dataset = settings.kind.as_str(),
        rows = full.num_rows(),
        filtered = filtered.num_rows(),
        ?applied,
        "dataset processed"
    );
    Ok(FilteredDataset {
        full,
        filtered,
        observed,
        applied,
    })
}

/// Resolve, load and process one dataset from `data_dir`. A missing or
/// unreadable file yields an empty dataset, not an error.
#[tracing::instrument(level = "info", skip_all, fields(dataset = settings.kind.as_str()))]
pub fn run_dataset(
    data_dir: &Path,
    settings: &DatasetSettings,
    roster: &ExclusionRoster,
) -> Result<FilteredDataset> {
    let batch = load::load_dataset(data_dir, &settings.logical_name);
    process_batch(&batch, settings, roster)
}
