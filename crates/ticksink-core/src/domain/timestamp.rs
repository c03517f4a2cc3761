//! Provider timestamp handling.
//!
//! The intraday series is keyed by exchange-local strings such as
//! `2023-05-01 15:00:00`. Because every key has the same fixed-width,
//! most-significant-first layout, string order equals chronological order and
//! the newest observation is the maximal key. Keys are checked against that
//! layout before any comparison happens.

use std::cmp::Ordering;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Layout of the provider's series keys.
pub const PROVIDER_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const PROVIDER_TIMESTAMP_LEN: usize = 19;

time::serde::format_description!(
    pub provider_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

time::serde::format_description!(
    pub wall_clock_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);

/// Whether `key` has the fixed-width `YYYY-MM-DD HH:MM:SS` layout that makes
/// string comparison chronological.
pub fn is_sortable_timestamp_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    if bytes.len() != PROVIDER_TIMESTAMP_LEN {
        return false;
    }

    bytes.iter().enumerate().all(|(index, byte)| match index {
        4 | 7 => *byte == b'-',
        10 => *byte == b' ',
        13 | 16 => *byte == b':',
        _ => byte.is_ascii_digit(),
    })
}

/// Chronological order of two provider timestamp keys.
///
/// Only valid for keys accepted by [`is_sortable_timestamp_key`].
pub fn compare_provider_timestamps(left: &str, right: &str) -> Ordering {
    left.cmp(right)
}

/// The newest key under [`compare_provider_timestamps`], if any.
pub fn latest_timestamp_key<'a, I>(keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter()
        .max_by(|left, right| compare_provider_timestamps(left, right))
}

/// Parse a series key into the naive exchange-local observation time.
pub fn parse_observation_time(key: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(key, PROVIDER_TIMESTAMP_FORMAT)
}

/// Current UTC wall-clock time at microsecond precision, the resolution of a
/// SQL `TIMESTAMP` column.
pub fn now_utc_wall_clock() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let nanos = now.nanosecond();
    let now = now.replace_nanosecond(nanos - nanos % 1_000).unwrap_or(now);
    PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn provider_layout_sorts_chronologically_as_strings() {
        let keys = [
            "2023-04-30 23:00:00",
            "2023-05-01 09:00:00",
            "2023-05-01 15:00:00",
            "2023-12-01 04:00:00",
        ];
        for pair in keys.windows(2) {
            assert!(is_sortable_timestamp_key(pair[0]));
            assert_eq!(
                compare_provider_timestamps(pair[0], pair[1]),
                parse_observation_time(pair[0])
                    .expect("parse")
                    .cmp(&parse_observation_time(pair[1]).expect("parse"))
            );
        }
    }

    #[test]
    fn latest_key_is_the_string_maximum() {
        let keys = ["2023-05-01 14:00:00", "2023-05-01 16:00:00", "2023-05-01 15:00:00"];
        assert_eq!(latest_timestamp_key(keys), Some("2023-05-01 16:00:00"));
        assert_eq!(latest_timestamp_key(std::iter::empty()), None);
    }

    #[test]
    fn rejects_keys_outside_the_fixed_width_layout() {
        for key in [
            "2023-5-01 15:00:00",
            "2023-05-01T15:00:00",
            "2023-05-01 15:00",
            "2023-05-01 15:00:00Z",
            "yesterday",
            "",
        ] {
            assert!(!is_sortable_timestamp_key(key), "{key} should be rejected");
        }
    }

    #[test]
    fn parses_observation_time_without_timezone_conversion() {
        let parsed = parse_observation_time("2023-05-01 15:00:00").expect("parse");
        assert_eq!(parsed, datetime!(2023-05-01 15:00:00));
    }

    #[test]
    fn wall_clock_has_microsecond_resolution() {
        let now = now_utc_wall_clock();
        assert_eq!(now.nanosecond() % 1_000, 0);
    }
}
