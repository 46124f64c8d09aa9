use crate::dataset::{measure_status_label, DatasetKind, DatasetSchema, ExclusionRoster};
use crate::process::columns::ColumnRoles;
use crate::process::date_parser;
use crate::process::utils::{date_column, string_column};
use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Date32Array, StringArray},
    compute::filter_record_batch,
    datatypes::{DataType, Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DATE_REF_COLUMN: &str = "date_ref";
pub const STATUS_LABEL_COLUMN: &str = "status_label";

/// A dataset after normalization: the source columns plus `date_ref`
/// (`Date32`) and `status_label` (`Utf8`) appended at the end.
#[derive(Clone, Debug)]
pub struct NormalizedTable {
    pub kind: DatasetKind,
    pub batch: RecordBatch,
    /// Source columns backing each role, resolved once at normalization.
    pub roles: ColumnRoles,
    date_ref: usize,
    status_label: usize,
}

impl NormalizedTable {
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn date_refs(&self) -> Result<&Date32Array> {
        date_column(&self.batch, self.date_ref)
            .ok_or_else(|| anyhow!("{} is not a Date32 column", DATE_REF_COLUMN))
    }

    pub fn status_labels(&self) -> Result<&StringArray> {
        string_column(&self.batch, self.status_label)
            .ok_or_else(|| anyhow!("{} is not a Utf8 column", STATUS_LABEL_COLUMN))
    }

    /// The responsible-party source column, when one was resolved.
    pub fn responsible(&self) -> Option<&StringArray> {
        self.roles
            .responsible
            .and_then(|i| string_column(&self.batch, i))
    }

    /// `date_ref` of row `i`, `None` when null.
    pub fn date_at(&self, i: usize) -> Result<Option<NaiveDate>> {
        let dates = self.date_refs()?;
        Ok(if dates.is_valid(i) {
            date_parser::from_epoch_days(dates.value(i))
        } else {
            None
        })
    }

    /// Same table restricted to the rows where `mask` is true.
    pub fn select(&self, mask: &BooleanArray) -> Result<Self> {
        Ok(Self {
            kind: self.kind,
            batch: filter_record_batch(&self.batch, mask)?,
            roles: self.roles,
            date_ref: self.date_ref,
            status_label: self.status_label,
        })
    }
}

/// Turn a column-normalized batch into a [`NormalizedTable`].
///
/// Dates that do not parse become null; no row is dropped for that. For
/// quality measures the status code is mapped to its label and rows whose
/// responsible party is on `roster` are removed.
pub fn normalize(
    batch: &RecordBatch,
    kind: DatasetKind,
    spec: &DatasetSchema,
    roster: &ExclusionRoster,
) -> Result<NormalizedTable> {
    let schema = batch.schema();
    let roles = ColumnRoles::resolve(&schema, spec);
    let n = batch.num_rows();

    let dates: Date32Array = match roles.date.and_then(|i| string_column(batch, i)) {
        Some(col) => col
            .iter()
            .map(|v| v.and_then(date_parser::parse_date).map(date_parser::to_epoch_days))
            .collect(),
        None => {
            if n > 0 {
                warn!(dataset = kind.as_str(), "no date column, date_ref left null");
            }
            Date32Array::from(vec![None; n])
        }
    };
    let parsed = n - dates.null_count();
    debug!(dataset = kind.as_str(), rows = n, parsed, "parsed date_ref");

    let labels: StringArray = match roles.status.and_then(|i| string_column(batch, i)) {
        Some(col) => match kind {
            DatasetKind::MaintenanceNotes => col.clone(),
            DatasetKind::QualityMeasures => col
                .iter()
                .map(|v| v.and_then(measure_status_label))
                .collect(),
        },
        None => StringArray::from(vec![None::<&str>; n]),
    };

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(DATE_REF_COLUMN, DataType::Date32, true));
    fields.push(Field::new(STATUS_LABEL_COLUMN, DataType::Utf8, true));
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.push(Arc::new(dates) as ArrayRef);
    columns.push(Arc::new(labels) as ArrayRef);

    let date_ref = columns.len() - 2;
    let status_label = columns.len() - 1;
    let table = NormalizedTable {
        kind,
        batch: RecordBatch::try_new_with_options(
            Arc::new(Schema::new(fields)),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(n)),
        )?,
        roles,
        date_ref,
        status_label,
    };

    match kind {
        DatasetKind::MaintenanceNotes => Ok(table),
        DatasetKind::QualityMeasures => exclude_roster(table, roster),
    }
}

/// Drop every row whose trimmed responsible party is on the roster.
fn exclude_roster(table: NormalizedTable, roster: &ExclusionRoster) -> Result<NormalizedTable> {
    let Some(responsible) = table.responsible() else {
        if !table.is_empty() {
            warn!(dataset = table.kind.as_str(), "no responsible column, roster not applied");
        }
        return Ok(table);
    };
    let keep: BooleanArray = responsible
        .iter()
        .map(|v| Some(!v.map(|id| roster.contains(id)).unwrap_or(false)))
        .collect();
    let kept = table.select(&keep)?;
    info!(
        dataset = kept.kind.as_str(),
        excluded = table.num_rows() - kept.num_rows(),
        remaining = kept.num_rows(),
        "applied exclusion roster"
    );
    Ok(kept)
}
