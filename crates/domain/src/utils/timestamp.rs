//! Stored timestamp encoding.
//!
//! Timestamps are persisted as RFC 3339 text in UTC with millisecond
//! precision and a `Z` suffix (`2025-03-01T09:15:00.000Z`). The fixed width
//! keeps lexicographic order equal to chronological order, so the store can
//! filter with plain string comparison.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::{Result, WorkPulseError};

/// Encode a timestamp for storage.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decode a stored timestamp, accepting any RFC 3339 offset.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| WorkPulseError::Corrupt(format!("unparseable timestamp '{raw}': {err}")))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn formats_fixed_width_utc() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 15, 0).unwrap();
        assert_eq!(format_timestamp(at), "2025-03-01T09:15:00.000Z");
    }

    #[test]
    fn parses_offsets_into_utc() {
        let parsed = parse_timestamp("2025-03-01T10:15:00+01:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 9, 15, 0).unwrap());
    }

    #[test]
    fn rejects_garbage_as_corrupt() {
        assert!(matches!(parse_timestamp("yesterday"), Err(WorkPulseError::Corrupt(_))));
    }

    #[test]
    fn lexicographic_order_matches_time_order() {
        let earlier = format_timestamp(Utc.with_ymd_and_hms(2025, 3, 1, 9, 59, 59).unwrap());
        let later = format_timestamp(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        assert!(earlier < later);
    }
}
