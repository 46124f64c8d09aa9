use crate::process::records::NormalizedTable;
use anyhow::Result;
use arrow::array::Array;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rows per status label. A `None` label is its own group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status_label: Option<String>,
    pub count: usize,
}

/// Rows per (category, status label) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CrossCount {
    pub category: Option<String>,
    pub status_label: Option<String>,
    pub count: usize,
}

/// Group by key order, then stable-sort by descending count.
fn sorted_by_count<K: Ord>(groups: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut out: Vec<(K, usize)> = groups.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

pub fn status_counts(table: &NormalizedTable) -> Result<Vec<StatusCount>> {
    let mut groups: BTreeMap<Option<String>, usize> = BTreeMap::new();
    for label in table.status_labels()?.iter() {
        *groups.entry(label.map(str::to_string)).or_default() += 1;
    }
    Ok(sorted_by_count(groups)
        .into_iter()
        .map(|(status_label, count)| StatusCount {
            status_label,
            count,
        })
        .collect())
}

/// Responsible party x status label. Without a responsible column every row
/// lands in the `None` category.
pub fn cross_tab(table: &NormalizedTable) -> Result<Vec<CrossCount>> {
    let labels = table.status_labels()?;
    let responsible = table.responsible();

    let mut groups: BTreeMap<(Option<String>, Option<String>), usize> = BTreeMap::new();
    for i in 0..labels.len() {
        let category = responsible
            .filter(|col| col.is_valid(i))
            .map(|col| col.value(i).to_string());
        let label = labels.is_valid(i).then(|| labels.value(i).to_string());
        *groups.entry((category, label)).or_default() += 1;
    }
    Ok(sorted_by_count(groups)
        .into_iter()
        .map(|((category, status_label), count)| CrossCount {
            category,
            status_label,
            count,
        })
        .collect())
}

/// Rows whose status label equals `label`.
pub fn count_label(table: &NormalizedTable, label: &str) -> Result<usize> {
    Ok(table
        .status_labels()?
        .iter()
        .filter(|v| *v == Some(label))
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{
        DatasetKind, DatasetSchema, ExclusionRoster, LABEL_MEASURE_CLOSED, LABEL_MEASURE_RELEASED,
    };
    use crate::load::{empty_batch, RawTable};
    use crate::process::records::normalize;

    fn measures(rows: &[(&str, Option<&str>)]) -> NormalizedTable {
        let mut raw = RawTable::new(vec!["Status".into(), "Responsável".into()]);
        for (status, who) in rows {
            raw.push_row(vec![Some(status.to_string()), who.map(str::to_string)]);
        }
        normalize(
            &raw.into_record_batch().unwrap(),
            DatasetKind::QualityMeasures,
            &DatasetSchema::for_kind(DatasetKind::QualityMeasures),
            ExclusionRoster::standard(),
        )
        .unwrap()
    }

    fn label(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn status_totals_sorted_by_count() -> Result<()> {
        let table = measures(&[
            ("MEDE", Some("JOAO")),
            ("MEDL", Some("JOAO")),
            ("MEDE", Some("MARIA")),
            ("OTHER", Some("MARIA")),
        ]);
        assert_eq!(
            status_counts(&table)?,
            vec![
                StatusCount { status_label: label(LABEL_MEASURE_CLOSED), count: 2 },
                StatusCount { status_label: None, count: 1 },
                StatusCount { status_label: label(LABEL_MEASURE_RELEASED), count: 1 },
            ]
        );
        Ok(())
    }

    #[test]
    fn cross_tab_keeps_null_keys() -> Result<()> {
        let table = measures(&[
            ("MEDE", Some("JOAO")),
            ("MEDE", Some("JOAO")),
            ("MEDL", Some("JOAO")),
            ("MEDL", None),
            ("MEDL", Some("MARIA")),
            ("MEDL", Some("MARIA")),
            ("MEDL", Some("MARIA")),
        ]);
        let rows = cross_tab(&table)?;
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            CrossCount {
                category: label("MARIA"),
                status_label: label(LABEL_MEASURE_RELEASED),
                count: 3,
            }
        );
        assert_eq!(
            rows[1],
            CrossCount {
                category: label("JOAO"),
                status_label: label(LABEL_MEASURE_CLOSED),
                count: 2,
            }
        );
        assert!(rows.contains(&CrossCount {
            category: None,
            status_label: label(LABEL_MEASURE_RELEASED),
            count: 1
        }));
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), table.num_rows());
        Ok(())
    }

    #[test]
    fn label_counts() -> Result<()> {
        let table = measures(&[("MEDE", None), ("MEDL", None), ("MEDE", None)]);
        assert_eq!(count_label(&table, LABEL_MEASURE_CLOSED)?, 2);
        assert_eq!(count_label(&table, LABEL_MEASURE_RELEASED)?, 1);
        assert_eq!(count_label(&table, "ABERTO")?, 0);
        Ok(())
    }

    #[test]
    fn empty_table_aggregates_to_nothing() -> Result<()> {
        let table = normalize(
            &empty_batch(),
            DatasetKind::QualityMeasures,
            &DatasetSchema::for_kind(DatasetKind::QualityMeasures),
            ExclusionRoster::standard(),
        )?;
        assert!(status_counts(&table)?.is_empty());
        assert!(cross_tab(&table)?.is_empty());
        assert_eq!(count_label(&table, LABEL_MEASURE_CLOSED)?, 0);
        Ok(())
    }
}
