// src/dataset.rs
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The two exports the dashboard reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// "ZC" maintenance notes, open/closed.
    MaintenanceNotes,
    /// "QM" quality measures, released/closed.
    QualityMeasures,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::MaintenanceNotes => "ZC",
            DatasetKind::QualityMeasures => "QM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "zc" | "maintenancenotes" | "notes" => Some(DatasetKind::MaintenanceNotes),
            "qm" | "qualitymeasures" | "measures" => Some(DatasetKind::QualityMeasures),
            _ => None,
        }
    }

    /// Logical file name looked up when the config does not override it.
    pub fn default_logical_name(&self) -> &'static str {
        match self {
            DatasetKind::MaintenanceNotes => "Notas_ZC",
            DatasetKind::QualityMeasures => "Notas_QM",
        }
    }
}

pub const STATUS_OPEN: &str = "ABERTO";
pub const STATUS_CLOSED: &str = "ENCERRADO";

pub const LABEL_MEASURE_RELEASED: &str = "Measure Released";
pub const LABEL_MEASURE_CLOSED: &str = "Measure Closed";

/// Maps a raw QM status code to its display label. Trimmed, case-sensitive.
pub fn measure_status_label(raw: &str) -> Option<&'static str> {
    match raw.trim() {
        "MEDL" => Some(LABEL_MEASURE_RELEASED),
        "MEDE" => Some(LABEL_MEASURE_CLOSED),
        _ => None,
    }
}

/// How a semantic column is located in a header set: the first alias present
/// wins, otherwise the positional index (if the table is wide enough).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    pub aliases: Vec<String>,
    pub position: Option<usize>,
}

impl ColumnSpec {
    pub fn new(aliases: &[&str], position: Option<usize>) -> Self {
        Self {
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            position,
        }
    }
}

/// The semantic roles a dataset needs resolved out of its header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSchema {
    pub date: ColumnSpec,
    pub status: ColumnSpec,
    pub responsible: ColumnSpec,
}

impl DatasetSchema {
    pub fn for_kind(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::MaintenanceNotes => Self {
                date: ColumnSpec::new(&["Data encermto."], Some(0)),
                status: ColumnSpec::new(&["Status sistema"], Some(3)),
                responsible: ColumnSpec::new(&["Responsável", "Modificado por"], None),
            },
            // No positional date fallback: without either column QM has no date filtering.
            DatasetKind::QualityMeasures => Self {
                date: ColumnSpec::new(&["Modificado em", "Dta.criação"], None),
                status: ColumnSpec::new(&["Status"], None),
                responsible: ColumnSpec::new(&["Responsável", "Modificado por"], Some(4)),
            },
        }
    }
}

const STANDARD_EXCLUSIONS: [&str; 12] = [
    "ABORIN", "SANT1733", "WILL8526", "MORE4174", "VIEI2975", "HORSIM", "PINT5850", "MOLL2381",
    "SANC8196", "RAUL1806", "FVALERIO", "GUIM1197",
];

static STANDARD_ROSTER: Lazy<ExclusionRoster> =
    Lazy::new(|| ExclusionRoster::new(STANDARD_EXCLUSIONS));

/// Responsible-party identifiers that are not part of the team and are
/// dropped from quality measures. Matching trims the candidate and is
/// case-sensitive.
#[derive(Clone, Debug, Default)]
pub struct ExclusionRoster {
    ids: HashSet<String>,
}

impl ExclusionRoster {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(|s| s.into().trim().to_string()).collect(),
        }
    }

    /// The process-wide roster used by the dashboard.
    pub fn standard() -> &'static ExclusionRoster {
        &STANDARD_ROSTER
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id.trim())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
