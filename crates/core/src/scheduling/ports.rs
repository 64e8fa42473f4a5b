//! Port interfaces for availability scheduling
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use slotline_domain::{Booking, BookingStatus, DaysOff, Result, TimeOff};

/// Trait for persisting and querying bookings.
///
/// Implementations must enforce start-timestamp uniqueness atomically at
/// write time; two racing writes for the same instant must not both succeed.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new booking, rejecting overlap on the exact start instant
    async fn create(&self, booking: &Booking) -> Result<()>;

    /// All bookings starting within `[start, end)`, ordered by start time
    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>>;

    /// Atomic status transition
    async fn set_status(&self, id: &str, status: BookingStatus) -> Result<()>;

    /// Hard-delete a booking
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete pending bookings created before `cutoff`, returning the count.
    ///
    /// The scheduler itself never deletes stale pending rows; it merely stops
    /// counting them as busy. This reaper runs as a separate sweep.
    async fn reap_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Trait for the working-calendar exceptions (time-off and full closures).
#[async_trait]
pub trait WorkCalendarRepository: Send + Sync {
    /// Time-off entries dated within the inclusive `[start, end]` day range
    async fn time_off_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<TimeOff>>;

    /// Closures overlapping the inclusive `[start, end]` day range
    async fn days_off_overlapping(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<DaysOff>>;

    /// Record a time-off entry, validating its window
    async fn add_time_off(&self, time_off: &TimeOff) -> Result<()>;

    /// Record a closure range, validating its bounds
    async fn add_days_off(&self, days_off: &DaysOff) -> Result<()>;
}
