//! Local-time helpers for the configured business timezone.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use slotline_domain::{Result, SlotlineError};

/// Parse an IANA timezone name from configuration.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SlotlineError::Config(format!("unknown timezone: {name}")))
}

/// Resolve a wall-clock instant in `tz` to UTC.
///
/// DST fold ambiguity resolves to the earlier instant; a nonexistent local
/// time (spring-forward gap) is rejected.
pub fn local_datetime(tz: Tz, day: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&day.and_time(time)) {
        LocalResult::Single(instant) => Ok(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(SlotlineError::InvalidInput(format!(
            "local time {time} does not exist on {day} in {tz}"
        ))),
    }
}

/// UTC bounds of the local calendar day `[midnight, next midnight)`.
pub fn local_day_bounds(tz: Tz, day: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next_day = day
        .succ_opt()
        .ok_or_else(|| SlotlineError::InvalidInput(format!("day {day} is out of range")))?;
    Ok((local_datetime(tz, day, NaiveTime::MIN)?, local_datetime(tz, next_day, NaiveTime::MIN)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timezone_accepts_iana_names() {
        parse_timezone("Europe/Berlin").unwrap();
        parse_timezone("UTC").unwrap();
    }

    #[test]
    fn parse_timezone_rejects_garbage() {
        assert!(matches!(parse_timezone("Nowhere/Special"), Err(SlotlineError::Config(_))));
    }

    #[test]
    fn day_bounds_cover_twenty_four_hours_in_utc() {
        let tz: Tz = "UTC".parse().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        let (start, end) = local_day_bounds(tz, day).unwrap();
        assert_eq!((end - start).num_hours(), 24);
    }

    #[test]
    fn dst_fold_resolves_to_earlier_instant() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        // 2025-10-26 02:30 occurs twice in Berlin
        let day = NaiveDate::from_ymd_opt(2025, 10, 26).unwrap();
        let time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        local_datetime(tz, day, time).unwrap();
    }
}
