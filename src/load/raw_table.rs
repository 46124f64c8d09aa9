use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::sync::Arc;

/// Cells pandas-style readers treat as missing.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A parsed file before it becomes an Arrow batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawTable {
    /// Column names exactly as the file's header row states them.
    pub headers: Vec<String>,
    /// One entry per data row; `None` is a missing cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Push a row, padding short rows with missing cells.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    /// Every column becomes a nullable `Utf8` field.
    pub fn into_record_batch(self) -> Result<RecordBatch, ArrowError> {
        let fields: Vec<Field> = self
            .headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect();
        let num_rows = self.rows.len();

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(self.headers.len());
        for i in 0..self.headers.len() {
            let values: StringArray = self
                .rows
                .iter()
                .map(|row| row.get(i).and_then(|v| v.as_deref()))
                .collect();
            columns.push(Arc::new(values) as ArrayRef);
        }

        RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(num_rows)),
        )
    }
}

/// Header cells that are blank get a positional placeholder name.
pub fn header_name(raw: &str, index: usize) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {}", index)
    } else {
        raw.to_string()
    }
}

/// `None` for blank cells and the usual missing-value markers.
pub fn cell_value(raw: &str) -> Option<String> {
    if MISSING_MARKERS.contains(&raw.trim()) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// The canonical empty table: no columns, no rows.
pub fn empty_batch() -> RecordBatch {
    RecordBatch::new_empty(Arc::new(Schema::empty()))
}
