use crate::error::LoadError;
use crate::load::raw_table::{cell_value, header_name, RawTable};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;
use tracing::debug;

/// Extensions handed to the workbook reader instead of the text parser.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Day 0 of the 1900 date system (1899-12-30) counted from 0001-01-01.
const EXCEL_EPOCH_DAYS_FROM_CE: i64 = 693_594;
const SECS_PER_DAY: i64 = 86_400;

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SPREADSHEET_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read the first sheet; its first row is the header.
pub fn read_first_sheet(path: &Path) -> Result<RawTable, LoadError> {
    let spreadsheet_err = |message: String| LoadError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| spreadsheet_err("workbook has no sheets".into()))?;
    debug!(sheet = %sheet, "reading first sheet");

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| spreadsheet_err(e.to_string()))?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| LoadError::SchemaMismatch {
        path: path.to_path_buf(),
        reason: format!("sheet `{}` is empty", sheet),
    })?;

    let mut table = RawTable::new(
        header
            .iter()
            .enumerate()
            .map(|(i, cell)| header_name(&cell_text(cell).unwrap_or_default(), i))
            .collect(),
    );
    for row in rows {
        let values: Vec<Option<String>> = row.iter().map(cell_text).collect();
        if values.iter().all(Option::is_none) {
            continue;
        }
        table.push_row(values);
    }
    Ok(table)
}

/// Render one cell as text. Dates come out as `YYYY-MM-DD HH:MM:SS` so the
/// same date parser handles workbook and text sources.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => cell_value(s),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) if dt.is_datetime() => {
            serial_to_text(dt.as_f64()).or_else(|| Some(format_float(dt.as_f64())))
        }
        Data::DateTime(dt) => Some(format_float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => cell_value(s),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Convert an Excel serial date (1900 system) to ISO text.
pub fn serial_to_text(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let total_secs = (serial * SECS_PER_DAY as f64).round() as i64;
    let days = total_secs.div_euclid(SECS_PER_DAY);
    let secs = total_secs.rem_euclid(SECS_PER_DAY) as u32;

    let date = NaiveDate::from_num_days_from_ce_opt(
        i32::try_from(EXCEL_EPOCH_DAYS_FROM_CE + days).ok()?,
    )?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)?;
    Some(date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn spreadsheet_extension_detection() {
        assert!(is_spreadsheet(Path::new("Notas_ZC.xlsx")));
        assert!(is_spreadsheet(Path::new("Notas_ZC.XLSX")));
        assert!(!is_spreadsheet(Path::new("Notas_QM.xlsx - Sheet1.csv")));
        assert!(!is_spreadsheet(Path::new("Notas_QM")));
    }

    #[test]
    fn serial_dates_render_as_iso() {
        assert_eq!(serial_to_text(45306.0).as_deref(), Some("2024-01-15 00:00:00"));
        assert_eq!(serial_to_text(45306.5).as_deref(), Some("2024-01-15 12:00:00"));
        assert_eq!(serial_to_text(f64::NAN), None);
    }

    #[test]
    fn cell_text_conversions() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".into())), None);
        assert_eq!(cell_text(&Data::String("MEDL".into())).as_deref(), Some("MEDL"));
        assert_eq!(cell_text(&Data::Int(42)).as_deref(), Some("42"));
        assert_eq!(cell_text(&Data::Float(10.0)).as_deref(), Some("10"));
        assert_eq!(cell_text(&Data::Float(2.5)).as_deref(), Some("2.5"));
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-02-01T08:00:00".into())).as_deref(),
            Some("2024-02-01T08:00:00")
        );
    }

    #[test]
    fn unreadable_workbook_is_a_spreadsheet_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path: PathBuf = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive")?;
        let err = read_first_sheet(&path).unwrap_err();
        assert_eq!(err.kind(), "spreadsheet");
        Ok(())
    }
}
