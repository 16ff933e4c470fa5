//! Calendar timestamp parsing for `after_than` / `before_than`.

use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const SPACED: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const T_SEPARATED: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATE_ONLY: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a textual timestamp to an absolute instant.
///
/// RFC 3339 strings keep their offset; naive date-times and bare dates are
/// taken as UTC (dates at midnight).
pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if let Ok(t) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(t);
    }
    for format in [SPACED, T_SEPARATED] {
        if let Ok(t) = PrimitiveDateTime::parse(s, format) {
            return Some(t.assume_utc());
        }
    }
    Date::parse(s, DATE_ONLY)
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Interpret seconds since the Unix epoch.
pub fn from_unix_seconds(seconds: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parse_rfc3339_keeps_offset() {
        let t = parse_timestamp("2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(t, datetime!(2024-03-01 10:00:00 UTC));
    }

    #[test]
    fn parse_naive_datetime_as_utc() {
        assert_eq!(
            parse_timestamp("2024-03-01 08:30:00"),
            Some(datetime!(2024-03-01 08:30:00 UTC))
        );
        assert_eq!(
            parse_timestamp("2024-03-01T08:30:00"),
            Some(datetime!(2024-03-01 08:30:00 UTC))
        );
    }

    #[test]
    fn parse_date_at_midnight() {
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(datetime!(2024-03-01 00:00:00 UTC))
        );
    }

    #[test]
    fn reject_non_timestamps() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn unix_seconds() {
        assert_eq!(from_unix_seconds(0), Some(datetime!(1970-01-01 00:00:00 UTC)));
    }
}
