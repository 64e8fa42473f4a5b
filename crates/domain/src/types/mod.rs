//! Domain types and models

pub mod booking;
pub mod calendar;
pub mod outbox;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use booking::{Booking, BookingStatus, ServiceProfile};
pub use calendar::{DaysOff, TimeOff, TimeOffWindow};
pub use outbox::{OutboxEvent, OutboxEventType, SweepStats};

/// A bookable time interval matching a service's duration exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A half-open `[start, end)` range that excludes slot candidates: a booking
/// padded by its trailing buffer, or a time-off window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Half-open overlap test against a candidate `[start, end)` interval.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}
