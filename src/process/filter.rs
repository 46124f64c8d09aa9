use crate::process::date_parser;
use crate::process::records::NormalizedTable;
use anyhow::Result;
use arrow::array::{Array, BooleanArray};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Inclusive date window. `start > end` is kept as given and matches nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Min and max of the non-null `date_ref` values, `None` when there are none.
pub fn observed_bounds(table: &NormalizedTable) -> Result<Option<DateRange>> {
    let dates = table.date_refs()?;
    let mut bounds: Option<(i32, i32)> = None;
    for v in dates.iter().flatten() {
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    Ok(bounds.and_then(|(lo, hi)| {
        Some(DateRange::new(
            date_parser::from_epoch_days(lo)?,
            date_parser::from_epoch_days(hi)?,
        ))
    }))
}

/// Rows whose `date_ref` falls inside `range`, both ends inclusive.
///
/// A table without a single valid date is returned unfiltered. Otherwise rows
/// with a null `date_ref` never match.
pub fn filter_by_date(table: &NormalizedTable, range: DateRange) -> Result<NormalizedTable> {
    let dates = table.date_refs()?;
    if dates.len() == dates.null_count() {
        debug!(dataset = table.kind.as_str(), "no valid dates, filter skipped");
        return Ok(table.clone());
    }

    let start = date_parser::to_epoch_days(range.start);
    let end = date_parser::to_epoch_days(range.end);
    let mask: BooleanArray = dates
        .iter()
        .map(|v| Some(v.map(|d| start <= d && d <= end).unwrap_or(false)))
        .collect();

    let filtered = table.select(&mask)?;
    debug!(
        dataset = table.kind.as_str(),
        start = %range.start,
        end = %range.end,
        before = table.num_rows(),
        after = filtered.num_rows(),
        "filtered by date"
    );
    Ok(filtered)
}
