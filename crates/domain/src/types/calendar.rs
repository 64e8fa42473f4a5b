//! Working-calendar exceptions: single-day time-off windows and full
//! multi-day closures.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, SlotlineError};

/// A blocked window within one working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOffWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// A recurring single-day exception, e.g. a lunch break or an appointment
/// elsewhere. A `TimeOff` without a window carries a reason only and never
/// blocks slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOff {
    pub id: String,
    pub date: NaiveDate,
    pub window: Option<TimeOffWindow>,
    pub reason: Option<String>,
}

impl TimeOff {
    pub fn new(date: NaiveDate, window: Option<TimeOffWindow>, reason: Option<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), date, window, reason }
    }

    /// Validate the window invariant at the write boundary.
    pub fn validate(&self) -> Result<()> {
        if let Some(window) = &self.window {
            if window.end <= window.start {
                return Err(SlotlineError::InvalidInput(format!(
                    "time-off window must end after it starts ({} <= {})",
                    window.end, window.start
                )));
            }
        }
        Ok(())
    }
}

/// A full closure covering every day in the inclusive `[start, end]` range.
///
/// Single-day closures (`start == end`) are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaysOff {
    pub id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reason: Option<String>,
}

impl DaysOff {
    pub fn new(start: NaiveDate, end: NaiveDate, reason: Option<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), start, end, reason }
    }

    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(SlotlineError::InvalidInput(format!(
                "days-off range must not end before it starts ({} < {})",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Inclusive range membership test.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_window_is_rejected() {
        let time_off = TimeOff::new(
            date(2025, 9, 15),
            Some(TimeOffWindow {
                start: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            }),
            None,
        );
        assert!(time_off.validate().is_err());
    }

    #[test]
    fn window_free_time_off_is_valid() {
        let time_off = TimeOff::new(date(2025, 9, 15), None, Some("training".into()));
        time_off.validate().unwrap();
    }

    #[test]
    fn single_day_closure_is_valid_and_inclusive() {
        let days_off = DaysOff::new(date(2025, 9, 15), date(2025, 9, 15), None);
        days_off.validate().unwrap();
        assert!(days_off.contains(date(2025, 9, 15)));
        assert!(!days_off.contains(date(2025, 9, 16)));
    }

    #[test]
    fn range_end_is_inclusive() {
        let days_off = DaysOff::new(date(2025, 9, 15), date(2025, 9, 18), None);
        assert!(days_off.contains(date(2025, 9, 18)));
        assert!(!days_off.contains(date(2025, 9, 14)));
    }
}
