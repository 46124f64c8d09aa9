// src/report/mod.rs
//! Display aggregates handed to the presentation layer.

pub mod aggregate;

use crate::dataset::{
    DatasetKind, LABEL_MEASURE_CLOSED, LABEL_MEASURE_RELEASED, STATUS_CLOSED, STATUS_OPEN,
};
use crate::process::{DateRange, FilteredDataset};
use anyhow::Result;
use serde::Serialize;

pub use aggregate::{count_label, cross_tab, status_counts, CrossCount, StatusCount};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub dataset: DatasetKind,
    pub rows: usize,
    pub observed: Option<DateRange>,
    pub applied: Option<DateRange>,
    /// Exactly two cards per dataset.
    pub metrics: Vec<Metric>,
    /// Grouped bar chart rows.
    pub bars: Vec<CrossCount>,
    /// Two-slice proportion chart rows.
    pub proportions: Vec<StatusCount>,
}

/// A dashboard section: waiting for data when the filtered view is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SectionReport {
    WaitingForData { dataset: DatasetKind },
    Ready(SectionView),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardReport {
    pub notes: SectionReport,
    pub measures: SectionReport,
}

fn metric(label: &str, value: usize) -> Metric {
    Metric {
        label: label.to_string(),
        value,
    }
}

fn two_slices(metrics: &[Metric]) -> Vec<StatusCount> {
    metrics
        .iter()
        .map(|m| StatusCount {
            status_label: Some(m.label.clone()),
            count: m.value,
        })
        .collect()
}

/// Closed notes come from the filtered view; open notes carry no closure
/// date, so they are counted on the unfiltered table.
pub fn notes_section(data: &FilteredDataset) -> Result<SectionReport> {
    if data.filtered.is_empty() {
        return Ok(SectionReport::WaitingForData {
            dataset: DatasetKind::MaintenanceNotes,
        });
    }
    let metrics = vec![
        metric(STATUS_CLOSED, count_label(&data.filtered, STATUS_CLOSED)?),
        metric(STATUS_OPEN, count_label(&data.full, STATUS_OPEN)?),
    ];
    let bars = metrics
        .iter()
        .map(|m| CrossCount {
            category: Some(m.label.clone()),
            status_label: Some(m.label.clone()),
            count: m.value,
        })
        .collect();
    Ok(SectionReport::Ready(SectionView {
        dataset: DatasetKind::MaintenanceNotes,
        rows: data.filtered.num_rows(),
        observed: data.observed,
        applied: data.applied,
        proportions: two_slices(&metrics),
        metrics,
        bars,
    }))
}

/// Released/closed cards and pie from the filtered view, plus the
/// responsible-party breakdown.
pub fn measures_section(data: &FilteredDataset) -> Result<SectionReport> {
    if data.filtered.is_empty() {
        return Ok(SectionReport::WaitingForData {
            dataset: DatasetKind::QualityMeasures,
        });
    }
    let metrics = vec![
        metric(LABEL_MEASURE_CLOSED, count_label(&data.filtered, LABEL_MEASURE_CLOSED)?),
        metric(LABEL_MEASURE_RELEASED, count_label(&data.filtered, LABEL_MEASURE_RELEASED)?),
    ];
    Ok(SectionReport::Ready(SectionView {
        dataset: DatasetKind::QualityMeasures,
        rows: data.filtered.num_rows(),
        observed: data.observed,
        applied: data.applied,
        proportions: two_slices(&metrics),
        metrics,
        bars: cross_tab(&data.filtered)?,
    }))
}

pub fn build_report(
    notes: &FilteredDataset,
    measures: &FilteredDataset,
) -> Result<DashboardReport> {
    Ok(DashboardReport {
        notes: notes_section(notes)?,
        measures: measures_section(measures)?,
    })
}
