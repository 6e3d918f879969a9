//! RFC3339 timestamps for the `STARTED` and `FINISHED` marker files.
//!
//! Timestamps are written in local time with second precision, e.g.
//! `2014-05-21T12:30:00+02:00`, or with a `Z` suffix when the local offset is
//! UTC.

use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat};

/// Formats `time` as an RFC3339 timestamp in local time.
///
/// # Examples
///
/// ```rust
/// use statdir::timestamp;
/// use std::time::SystemTime;
///
/// let text = timestamp::format(SystemTime::now());
/// assert!(timestamp::parse(&text).is_some());
/// ```
pub fn format(time: SystemTime) -> String {
    DateTime::<Local>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses an RFC3339 timestamp, as found in a marker file.
///
/// Surrounding whitespace is ignored so that files edited by hand still parse.
pub fn parse(text: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(SystemTime::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_format_is_second_precision() {
        let time = UNIX_EPOCH + Duration::from_millis(1_400_000_000_250);
        let parsed = parse(&format(time)).unwrap();
        assert_eq!(parsed, UNIX_EPOCH + Duration::from_secs(1_400_000_000));
    }

    #[test]
    fn test_parse_utc() {
        let parsed = parse("2014-05-13T16:53:20Z").unwrap();
        assert_eq!(parsed, UNIX_EPOCH + Duration::from_secs(1_400_000_000));
    }

    #[test]
    fn test_parse_offset_and_whitespace() {
        let parsed = parse(" 2014-05-13T18:53:20+02:00\n").unwrap();
        assert_eq!(parsed, UNIX_EPOCH + Duration::from_secs(1_400_000_000));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_none());
        assert!(parse("").is_none());
    }
}
