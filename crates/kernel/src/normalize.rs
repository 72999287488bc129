//! Result row normalization.
//!
//! Rows leave the service with the modified-time column (`date`) in one
//! canonical ISO-8601 form, whatever textual form the store produced.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value as JsonValue;

use crate::query::types::DATE_OUTPUT;
use crate::store::RawRow;

/// A row ready to be returned to the caller.
pub type ResultRow = serde_json::Map<String, JsonValue>;

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Normalize one row.
///
/// A null or missing `date` is omitted from the output. Values that are
/// not recognizable date/times pass through untouched.
pub fn normalize(mut row: RawRow) -> ResultRow {
    match row.remove(DATE_OUTPUT) {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::String(raw)) => {
            let value = canonical_datetime(&raw).unwrap_or(raw);
            row.insert(DATE_OUTPUT.to_string(), JsonValue::String(value));
        }
        Some(other) => {
            row.insert(DATE_OUTPUT.to_string(), other);
        }
    }
    row
}

/// Rewrite a date/time string as `YYYY-MM-DDTHH:MM:SS[.ffffff][±HH:MM]`.
///
/// Fractional seconds are emitted at microsecond precision and only when
/// non-zero; the offset only when the input carried one. A bare date is
/// taken as midnight.
pub fn canonical_datetime(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(format_aware(&dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(format_aware(&dt));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(format_naive(&dt));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| format_naive(&dt))
}

fn format_naive(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() / 1_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn format_aware(dt: &DateTime<FixedOffset>) -> String {
    format!("{}{}", format_naive(&dt.naive_local()), dt.format("%:z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> RawRow {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("row must be an object"),
        }
    }

    #[test]
    fn naive_timestamp_is_canonical() {
        assert_eq!(
            canonical_datetime("2024-03-05T10:20:30").as_deref(),
            Some("2024-03-05T10:20:30")
        );
        assert_eq!(
            canonical_datetime("2024-03-05 10:20:30").as_deref(),
            Some("2024-03-05T10:20:30")
        );
    }

    #[test]
    fn fractional_seconds_use_microseconds() {
        assert_eq!(
            canonical_datetime("2024-03-05T10:20:30.5").as_deref(),
            Some("2024-03-05T10:20:30.500000")
        );
        assert_eq!(
            canonical_datetime("2024-03-05T10:20:30.000000").as_deref(),
            Some("2024-03-05T10:20:30")
        );
    }

    #[test]
    fn offsets_are_kept() {
        assert_eq!(
            canonical_datetime("2024-03-05T10:20:30Z").as_deref(),
            Some("2024-03-05T10:20:30+00:00")
        );
        assert_eq!(
            canonical_datetime("2024-03-05T10:20:30.123456+02:00").as_deref(),
            Some("2024-03-05T10:20:30.123456+02:00")
        );
    }

    #[test]
    fn bare_date_is_midnight() {
        assert_eq!(
            canonical_datetime("2024-03-05").as_deref(),
            Some("2024-03-05T00:00:00")
        );
    }

    #[test]
    fn garbage_is_not_a_datetime() {
        assert_eq!(canonical_datetime("yesterday"), None);
    }

    #[test]
    fn normalize_rewrites_date_only() {
        let out = normalize(row(json!({
            "filename": "a.pdf",
            "page_count": 3,
            "date": "2024-03-05 10:20:30"
        })));
        assert_eq!(out["date"], "2024-03-05T10:20:30");
        assert_eq!(out["filename"], "a.pdf");
        assert_eq!(out["page_count"], 3);
    }

    #[test]
    fn null_date_is_omitted() {
        let out = normalize(row(json!({"filename": "a.pdf", "date": null})));
        assert!(!out.contains_key("date"));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn unparseable_date_passes_through() {
        let out = normalize(row(json!({"date": "unknown"})));
        assert_eq!(out["date"], "unknown");
    }
}
