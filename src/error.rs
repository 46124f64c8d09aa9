// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Why a dataset could not be turned into a table. Every variant ends in the
/// same empty-table outcome; the variants exist so logs and tests can tell
/// them apart.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no file found for dataset `{0}`")]
    SourceAbsent(String),

    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no encoding produced a parseable table for {path} (tried {tried})")]
    Decode { path: PathBuf, tried: String },

    #[error("spreadsheet {path} could not be read: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("{path}: {reason}")]
    SchemaMismatch { path: PathBuf, reason: String },
}

impl LoadError {
    /// Short tag used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::SourceAbsent(_) => "source_absent",
            LoadError::Unreadable { .. } => "unreadable",
            LoadError::Decode { .. } => "decode",
            LoadError::Spreadsheet { .. } => "spreadsheet",
            LoadError::SchemaMismatch { .. } => "schema_mismatch",
        }
    }
}
