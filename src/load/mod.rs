// src/load/mod.rs
//! Locating a dataset file and turning it into an Arrow batch of string
//! columns. Loading never fails outward: every error collapses to the empty
//! table, after being logged.

pub mod delimited;
pub mod raw_table;
pub mod resolve;
pub mod spreadsheet;

use crate::error::LoadError;
use arrow::record_batch::RecordBatch;
use std::{fs, path::Path};
use tracing::{info, warn};

pub use delimited::TextEncoding;
pub use raw_table::{empty_batch, RawTable};
pub use resolve::resolve;

/// How the table was read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Delimited(TextEncoding),
}

#[derive(Debug)]
pub struct LoadedTable {
    pub batch: RecordBatch,
    pub format: SourceFormat,
}

/// Read `path` as a spreadsheet or delimited text, reporting why it failed.
/// The file handle is dropped before this returns, success or not.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.display()))]
pub fn try_load(path: &Path) -> Result<LoadedTable, LoadError> {
    let (raw, format) = if spreadsheet::is_spreadsheet(path) {
        (spreadsheet::read_first_sheet(path)?, SourceFormat::Spreadsheet)
    } else {
        let bytes = fs::read(path).map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(LoadError::SchemaMismatch {
                path: path.to_path_buf(),
                reason: "file is empty".into(),
            });
        }
        let (raw, encoding) =
            delimited::parse_bytes(&bytes).map_err(|failures| LoadError::Decode {
                path: path.to_path_buf(),
                tried: failures
                    .iter()
                    .map(|(enc, _)| enc.label())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        (raw, SourceFormat::Delimited(encoding))
    };

    let batch = raw
        .into_record_batch()
        .map_err(|e| LoadError::SchemaMismatch {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        ?format,
        "loaded table"
    );
    Ok(LoadedTable { batch, format })
}

/// Like [`try_load`], but any failure yields the empty table.
pub fn load(path: &Path) -> RecordBatch {
    match try_load(path) {
        Ok(loaded) => loaded.batch,
        Err(err) => {
            warn!(kind = err.kind(), error = %err, "load failed, using empty table");
            empty_batch()
        }
    }
}

/// Resolve `logical_name` under `dir` and load it.
pub fn try_load_dataset(dir: &Path, logical_name: &str) -> Result<LoadedTable, LoadError> {
    let path =
        resolve(dir, logical_name).ok_or_else(|| LoadError::SourceAbsent(logical_name.into()))?;
    try_load(&path)
}

/// Resolve and load, degrading to the empty table when the file is absent or
/// unreadable.
pub fn load_dataset(dir: &Path, logical_name: &str) -> RecordBatch {
    match try_load_dataset(dir, logical_name) {
        Ok(loaded) => loaded.batch,
        Err(err) => {
            warn!(logical_name, kind = err.kind(), error = %err, "dataset unavailable");
            empty_batch()
        }
    }
}
