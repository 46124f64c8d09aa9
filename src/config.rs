// src/config.rs
use crate::dataset::{ColumnSpec, DatasetKind, DatasetSchema};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Env var consulted when no config path is passed on the command line.
pub const CONFIG_ENV: &str = "NOTAS_DASHBOARD_CONFIG";
/// Picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.yaml";

/// Top-level settings. Every field is optional in the YAML file; unknown
/// keys are rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub notes: DatasetOverrides,
    pub measures: DatasetOverrides,
}

/// Per-dataset overrides; unset fields fall back to the dataset's defaults.
/// Alias lists and positional fallbacks override independently.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetOverrides {
    pub logical_name: Option<String>,
    pub date_aliases: Option<Vec<String>>,
    pub date_position: Option<usize>,
    pub status_aliases: Option<Vec<String>>,
    pub status_position: Option<usize>,
    pub responsible_aliases: Option<Vec<String>>,
    pub responsible_position: Option<usize>,
    pub range: RangeConfig,
}

/// Requested date window. Missing bounds default to the observed min/max.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RangeConfig {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Fully merged settings for one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetSettings {
    pub kind: DatasetKind,
    pub logical_name: String,
    pub columns: DatasetSchema,
    pub range: RangeConfig,
}

impl DatasetSettings {
    pub fn defaults(kind: DatasetKind) -> Self {
        Self {
            kind,
            logical_name: kind.default_logical_name().to_string(),
            columns: DatasetSchema::for_kind(kind),
            range: RangeConfig::default(),
        }
    }
}

impl Config {
    /// Parse a YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid dashboard config")
    }

    /// Explicit path, then `NOTAS_DASHBOARD_CONFIG`, then `./dashboard.yaml`,
    /// then built-in defaults. An explicitly named file must exist.
    pub fn discover(explicit: Option<PathBuf>) -> Result<Self> {
        let named = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        if let Some(path) = named {
            info!(path = %path.display(), "loading config");
            return Self::load(&path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            info!(path = %fallback.display(), "loading config");
            return Self::load(fallback);
        }
        debug!("no config file, using defaults");
        Ok(Self::default())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Merge the overrides for `kind` onto its defaults.
    pub fn dataset(&self, kind: DatasetKind) -> DatasetSettings {
        let overrides = match kind {
            DatasetKind::MaintenanceNotes => &self.notes,
            DatasetKind::QualityMeasures => &self.measures,
        };
        let mut settings = DatasetSettings::defaults(kind);
        if let Some(name) = &overrides.logical_name {
            settings.logical_name = name.clone();
        }
        merge_column(
            &mut settings.columns.date,
            &overrides.date_aliases,
            overrides.date_position,
        );
        merge_column(
            &mut settings.columns.status,
            &overrides.status_aliases,
            overrides.status_position,
        );
        merge_column(
            &mut settings.columns.responsible,
            &overrides.responsible_aliases,
            overrides.responsible_position,
        );
        settings.range = overrides.range;
        settings
    }
}

fn merge_column(
    spec: &mut ColumnSpec,
    aliases: &Option<Vec<String>>,
    position: Option<usize>,
) {
    if let Some(aliases) = aliases {
        spec.aliases = aliases.clone();
    }
    if position.is_some() {
        spec.position = position;
    }
}
