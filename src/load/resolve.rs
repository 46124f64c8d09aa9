use std::path::{Path, PathBuf};
use tracing::debug;

/// Candidate file names for a logical dataset name, most preferred first.
///
/// A name that already carries an extension is tried verbatim before the
/// generated variants.
pub fn candidates(logical_name: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(5);
    if Path::new(logical_name).extension().is_some() {
        out.push(logical_name.to_string());
    }
    out.push(format!("{}.xlsx", logical_name));
    out.push(format!("{}.csv", logical_name));
    // spreadsheet exports re-saved as CSV keep the workbook name plus sheet
    out.push(format!("{}.xlsx - Sheet1.csv", logical_name));
    out.push(format!("{}.xlsx - Planilha1.csv", logical_name));
    out
}

/// First candidate under `dir` that exists as a regular file.
pub fn resolve(dir: &Path, logical_name: &str) -> Option<PathBuf> {
    let found = candidates(logical_name)
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    match &found {
        Some(path) => debug!(logical_name, path = %path.display(), "resolved dataset file"),
        None => debug!(logical_name, dir = %dir.display(), "no dataset file found"),
    }
    found
}
