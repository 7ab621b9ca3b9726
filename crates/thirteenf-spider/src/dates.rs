use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::trace;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d", "%d-%b-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalize a date-like string to `YYYY-MM-DD`, or hand it back untouched.
///
/// Accepted shapes: plain dates (`2024-03-31`, `03/31/2024`, `20240331`, `31-Mar-2024`),
/// naive datetimes (`2024-03-31T00:00:00`, `2024-03-31 00:00:00`) and RFC 3339 timestamps
/// (`2024-03-31T16:05:27-04:00`, the date part as written). A value matching none of these is
/// returned as-is; it is never an error.
///
/// ```rust
/// use thirteenf_spider::dates::normalize_date;
///
/// assert_eq!(normalize_date("03/31/2024"), "2024-03-31");
/// assert_eq!(normalize_date("Q1 2024"), "Q1 2024");
/// ```
pub fn normalize_date(raw: &str) -> String {
    match parse_date(raw.trim()) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => {
            trace!("date \"{raw}\" not recognised, passing through");
            raw.to_string()
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}
