//! Row-mapping helpers shared by the SQLite repositories.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::types::Type;

/// Decode a unix-seconds column into a UTC timestamp.
pub(crate) fn datetime_from_unix(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {secs} out of range").into(),
        )
    })
}

/// Decode an ISO `YYYY-MM-DD` column into a calendar date.
pub(crate) fn date_from_iso(idx: usize, text: &str) -> rusqlite::Result<NaiveDate> {
    text.parse::<NaiveDate>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    })
}

/// Decode an ISO `HH:MM:SS` column into a wall-clock time.
pub(crate) fn time_from_iso(idx: usize, text: &str) -> rusqlite::Result<NaiveTime> {
    text.parse::<NaiveTime>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    })
}
