use crate::process::utils::clean_str;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};

/// 1970-01-01 counted from 0001-01-01, the offset between chrono's CE days
/// and Arrow's `Date32` epoch days.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Parse the date component of a cell. Accepts ISO dates (`-` or `/`),
/// day-first `dd/mm/yyyy`, `dd.mm.yyyy` and `dd-mm-yyyy`, compact `yyyymmdd`
/// and RFC 3339 timestamps. A trailing time (after a space or `T`) must be a
/// valid time of day but is otherwise discarded. Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let (date_part, time_part) = match s.find(|c| c == ' ' || c == 'T') {
        Some(idx) => (&s[..idx], Some(s[idx + 1..].trim())),
        None => (s, None),
    };
    if let Some(t) = time_part {
        if !t.is_empty() && !TIME_FORMATS.iter().any(|f| NaiveTime::parse_from_str(t, f).is_ok())
        {
            return None;
        }
    }

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date_part, "%Y%m%d").ok();
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())
}

/// Days since 1970-01-01, as stored in a `Date32` column.
pub fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}
