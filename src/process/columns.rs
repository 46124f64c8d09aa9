use crate::dataset::{ColumnSpec, DatasetSchema};
use anyhow::Result;
use arrow::{
    datatypes::{Field, Schema},
    record_batch::{RecordBatch, RecordBatchOptions},
};
use std::sync::Arc;
use tracing::debug;

/// Same data, header names trimmed of surrounding whitespace.
pub fn normalize_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_name(f.name().trim()))
        .collect();

    RecordBatch::try_new_with_options(
        Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone())),
        batch.columns().to_vec(),
        &RecordBatchOptions::new().with_row_count(Some(batch.num_rows())),
    )
    .map_err(Into::into)
}

/// Index of the column `spec` points at: first alias present in the header
/// set (in alias order), else the positional fallback when in bounds.
pub fn resolve_column(schema: &Schema, spec: &ColumnSpec) -> Option<usize> {
    spec.aliases
        .iter()
        .find_map(|alias| schema.fields().iter().position(|f| f.name() == alias))
        .or_else(|| spec.position.filter(|&p| p < schema.fields().len()))
}

/// Semantic columns resolved once per table. Indices stay valid through row
/// filtering, which never changes the schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnRoles {
    pub date: Option<usize>,
    pub status: Option<usize>,
    pub responsible: Option<usize>,
}

impl ColumnRoles {
    pub fn resolve(schema: &Schema, spec: &DatasetSchema) -> Self {
        let roles = Self {
            date: resolve_column(schema, &spec.date),
            status: resolve_column(schema, &spec.status),
            responsible: resolve_column(schema, &spec.responsible),
        };
        debug!(
            date = ?roles.date.map(|i| schema.field(i).name()),
            status = ?roles.status.map(|i| schema.field(i).name()),
            responsible = ?roles.responsible.map(|i| schema.field(i).name()),
            "resolved column roles"
        );
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetKind;
    use crate::load::RawTable;
    use arrow::datatypes::DataType;

    fn schema_of(names: &[&str]) -> Schema {
        Schema::new(
            names
                .iter()
                .map(|n| Field::new(*n, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn headers_are_trimmed_data_untouched() -> Result<()> {
        let mut raw = RawTable::new(vec![" Status ".into(), "\tResponsável".into()]);
        raw.push_row(vec![Some(" MEDL ".into()), Some("JOAO".into())]);
        let batch = normalize_columns(&raw.into_record_batch()?)?;

        let names: Vec<&String> = batch.schema_ref().fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["Status", "Responsável"]);
        assert_eq!(batch.num_rows(), 1);
        let status = crate::process::utils::string_column(&batch, 0).unwrap();
        assert_eq!(status.value(0), " MEDL ");
        Ok(())
    }

    #[test]
    fn normalizing_the_empty_table_keeps_it_empty() -> Result<()> {
        let batch = normalize_columns(&crate::load::empty_batch())?;
        assert_eq!(batch.num_columns(), 0);
        assert_eq!(batch.num_rows(), 0);
        Ok(())
    }

    #[test]
    fn alias_order_beats_header_order() {
        let schema = schema_of(&["Dta.criação", "Status", "Modificado em"]);
        let spec = ColumnSpec::new(&["Modificado em", "Dta.criação"], None);
        assert_eq!(resolve_column(&schema, &spec), Some(2));
    }

    #[test]
    fn positional_fallback_only_in_bounds() {
        let schema = schema_of(&["a", "b", "c", "d"]);
        let status = ColumnSpec::new(&["Status sistema"], Some(3));
        assert_eq!(resolve_column(&schema, &status), Some(3));
        assert_eq!(resolve_column(&schema, &ColumnSpec::new(&["x"], Some(4))), None);
        assert_eq!(resolve_column(&schema, &ColumnSpec::new(&["x"], None)), None);
    }

    #[test]
    fn roles_for_measures_export() {
        let schema = schema_of(&[
            "Medida",
            "Status",
            "Dta.criação",
            "Modificado por",
            "Responsável",
        ]);
        let qm = DatasetSchema::for_kind(DatasetKind::QualityMeasures);
        let roles = ColumnRoles::resolve(&schema, &qm);
        assert_eq!(
            roles,
            ColumnRoles {
                date: Some(2),
                status: Some(1),
                responsible: Some(4),
            }
        );

        // stable: same header set, same answer
        let again = ColumnRoles::resolve(&schema, &qm);
        assert_eq!(roles, again);
    }

    #[test]
    fn roles_for_notes_fall_back_to_positions() {
        let schema = schema_of(&["Fechada", "Nota", "Texto", "Situação"]);
        let zc = DatasetSchema::for_kind(DatasetKind::MaintenanceNotes);
        let roles = ColumnRoles::resolve(&schema, &zc);
        assert_eq!(roles.date, Some(0));
        assert_eq!(roles.status, Some(3));
        assert_eq!(roles.responsible, None);
    }
}
