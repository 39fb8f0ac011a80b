// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp formatting helpers.
//!
//! All timestamps are stored as UTC strings in a fixed millisecond format
//! so that lexicographic comparison in SQL matches chronological order.

use chrono::{DateTime, Utc};

/// The storage timestamp format: `2026-01-01T00:00:00.000Z`.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a UTC instant for storage.
pub fn format_ts(t: DateTime<Utc>) -> String {
    t.format(TS_FORMAT).to_string()
}

/// Current UTC instant in storage format.
pub fn now_ts() -> String {
    format_ts(Utc::now())
}

/// Parse a storage timestamp back into a UTC instant.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_and_parse_round_trip() {
        let t = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();
        let s = format_ts(t);
        assert_eq!(s, "2026-03-14T15:09:26.000Z");
        assert_eq!(parse_ts(&s), Some(t));
    }

    #[test]
    fn lexicographic_order_matches_chronological() {
        let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 9, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        assert!(format_ts(earlier) < format_ts(later));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_ts("not a timestamp"), None);
    }
}
