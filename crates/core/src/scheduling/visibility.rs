//! Booking visibility policy: which persisted bookings still occupy a slot.

use chrono::{DateTime, Duration, Utc};
use slotline_domain::{Booking, BookingStatus, SchedulingConfig};

/// Whether `booking` blocks its slot as seen at instant `now`.
///
/// Cancelled bookings never block. Pending bookings hold a soft lock on
/// their slot that expires `lock_timeout_min` after creation; an expired
/// pending booking stops blocking immediately even though its row still
/// exists until the reaper removes it.
pub fn occupies_slot(booking: &Booking, now: DateTime<Utc>, cfg: &SchedulingConfig) -> bool {
    match booking.status {
        BookingStatus::Cancelled => false,
        BookingStatus::Pending => {
            booking.created_at + Duration::minutes(cfg.lock_timeout_min) >= now
        }
        _ => true,
    }
}
