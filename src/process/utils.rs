use arrow::{
    array::{Date32Array, StringArray},
    record_batch::RecordBatch,
};

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Column `idx` as a string array, if it is one.
pub fn string_column(batch: &RecordBatch, idx: usize) -> Option<&StringArray> {
    batch.column(idx).as_any().downcast_ref::<StringArray>()
}

/// Column `idx` as a date array, if it is one.
pub fn date_column(batch: &RecordBatch, idx: usize) -> Option<&Date32Array> {
    batch.column(idx).as_any().downcast_ref::<Date32Array>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_space() {
        assert_eq!(clean_str("  \"2024-01-01\" "), "2024-01-01");
        assert_eq!(clean_str(" MEDL "), "MEDL");
        assert_eq!(clean_str("\""), "\"");
    }
}
