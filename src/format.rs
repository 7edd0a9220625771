//! Field formatters used when mapping platform channels into records.

use chrono::{Local, SecondsFormat, TimeZone};

/// Render an epoch-millisecond timestamp as RFC 3339 in the local offset.
pub fn format_timestamp(epoch_millis: i64) -> String {
    format_timestamp_in(epoch_millis, &Local)
}

/// Render an epoch-millisecond timestamp as RFC 3339 in the given zone.
///
/// Second precision; a zero offset is written as `Z`. Values chrono cannot
/// represent yield an empty string.
pub fn format_timestamp_in<Tz>(epoch_millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match tz.timestamp_millis_opt(epoch_millis).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => String::new(),
    }
}

/// True when the string holds at least one byte. Whitespace counts.
pub fn is_non_empty(s: &str) -> bool {
    !s.is_empty()
}
