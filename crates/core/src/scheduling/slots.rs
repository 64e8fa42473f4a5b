//! Slot generator: computes the free appointment slots of a single day.
//!
//! The generator walks candidate start times across the work window on a
//! fixed grid. A candidate that collides with a busy interval makes the walk
//! jump past the interval's end instead of re-testing every grid step inside
//! known-blocked time, then re-aligns to the grid so offered start times stay
//! on predictable boundaries.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use slotline_domain::{
    Booking, BusyInterval, Result, SchedulingConfig, ServiceProfile, Slot, SlotlineError, TimeOff,
};

use crate::time::local_datetime;

/// Generate the ordered free slots for `service` on `day`.
///
/// `bookings` must already be filtered to slot-occupying rows (see
/// [`crate::scheduling::visibility`]); each booking blocks its own interval
/// extended by its own service's trailing buffer. Time-off entries without a
/// window are ignored.
pub fn generate_slots(
    service: &ServiceProfile,
    day: NaiveDate,
    bookings: &[Booking],
    timeoffs: &[TimeOff],
    cfg: &SchedulingConfig,
    tz: Tz,
) -> Result<Vec<Slot>> {
    cfg.validate()?;

    let work_start = local_datetime(tz, day, work_time(cfg.work_start_hour)?)?;
    let work_end = local_datetime(tz, day, work_time(cfg.work_end_hour)?)?;

    let duration = Duration::minutes(service.duration_min);
    let step = Duration::minutes(cfg.grid_step_min);
    let busy = busy_intervals(day, bookings, timeoffs, tz)?;

    let mut slots = Vec::new();
    let mut current = work_start;

    while current + duration <= work_end {
        let candidate_end = current + duration;

        match busy.iter().find(|b| b.overlaps(current, candidate_end)) {
            Some(blocking) => {
                // Jump past the blocking interval, re-aligned to the grid.
                let target = blocking.end.max(current + step);
                current = align_up(work_start, target, step);
            }
            None => {
                slots.push(Slot { start: current, end: candidate_end });
                current += step;
            }
        }
    }

    Ok(slots)
}

/// Merge bookings (padded by their buffers) and windowed time-offs into a
/// single busy-interval list, sorted by start.
fn busy_intervals(
    day: NaiveDate,
    bookings: &[Booking],
    timeoffs: &[TimeOff],
    tz: Tz,
) -> Result<Vec<BusyInterval>> {
    let mut busy: Vec<BusyInterval> = Vec::with_capacity(bookings.len() + timeoffs.len());

    for booking in bookings {
        busy.push(BusyInterval { start: booking.starts_at, end: booking.busy_until() });
    }

    for time_off in timeoffs {
        // Entries without a window carry a reason only; they never block.
        let Some(window) = &time_off.window else { continue };
        busy.push(BusyInterval {
            start: local_datetime(tz, day, window.start)?,
            end: local_datetime(tz, day, window.end)?,
        });
    }

    busy.sort_by_key(|interval| interval.start);
    Ok(busy)
}

/// Round `target` up to the next grid point measured from `origin`.
fn align_up(origin: DateTime<Utc>, target: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let offset = (target - origin).num_seconds();
    let step_secs = step.num_seconds();
    let remainder = offset.rem_euclid(step_secs);
    if remainder == 0 {
        target
    } else {
        origin + Duration::seconds(offset - remainder + step_secs)
    }
}

fn work_time(hour: u32) -> Result<NaiveTime> {
    if hour == 24 {
        // A 24h close is expressed as the last second of the day; the slot
        // walk treats the bound as closed so this is equivalent in practice.
        return NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| SlotlineError::Internal("invalid end-of-day time".into()));
    }
    NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| SlotlineError::Config(format!("invalid work hour: {hour}")))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeZone, Timelike};
    use slotline_domain::{BookingStatus, TimeOffWindow};

    use super::*;

    fn tz() -> Tz {
        "UTC".parse().unwrap()
    }

    fn cfg() -> SchedulingConfig {
        SchedulingConfig {
            work_start_hour: 10,
            work_end_hour: 20,
            grid_step_min: 10,
            ..Default::default()
        }
    }

    fn service(duration_min: i64, buffer_after_min: i64) -> ServiceProfile {
        ServiceProfile {
            id: "svc-1".into(),
            name: "Manicure".into(),
            duration_min,
            buffer_after_min,
        }
    }

    fn day() -> NaiveDate {
        // A Monday
        NaiveDate::from_ymd_opt(2025, 9, 15).unwrap()
    }

    fn booking_at(hour: u32, minute: u32, duration_min: i64, buffer_min: i64) -> Booking {
        let start = Utc
            .with_ymd_and_hms(2025, 9, 15, hour, minute, 0)
            .unwrap();
        let mut booking = Booking::new(
            "Test",
            "123",
            "",
            service(duration_min, buffer_min),
            start,
            start + Duration::minutes(duration_min),
        );
        booking.status = BookingStatus::Confirmed;
        booking
    }

    fn slot_starts(slots: &[Slot]) -> Vec<(u32, u32)> {
        slots.iter().map(|s| (s.start.hour(), s.start.minute())).collect()
    }

    #[test]
    fn empty_day_fills_the_whole_window() {
        let slots = generate_slots(&service(60, 15), day(), &[], &[], &cfg(), tz()).unwrap();

        assert_eq!(slots.first().unwrap().start.hour(), 10);
        // 10:00 through 19:00 inclusive on a 10-minute grid
        assert_eq!(slots.len(), 55);
    }

    #[test]
    fn last_slot_may_end_exactly_at_work_end() {
        let slots = generate_slots(&service(60, 15), day(), &[], &[], &cfg(), tz()).unwrap();
        let last = slots.last().unwrap();

        assert_eq!((last.end.hour(), last.end.minute()), (20, 0));
    }

    #[test]
    fn booking_blocks_slots_and_walk_jumps_past_buffer() {
        // 90-minute appointment at 13:00 with a 15-minute buffer blocks
        // [13:00, 14:45); the next on-grid candidate is 14:50.
        let booking = booking_at(13, 0, 90, 15);
        let slots =
            generate_slots(&service(60, 15), day(), &[booking], &[], &cfg(), tz()).unwrap();
        let starts = slot_starts(&slots);

        assert!(!starts.contains(&(13, 0)));
        assert!(!starts.contains(&(14, 0)));
        assert!(starts.contains(&(12, 0)), "slot ending exactly at the booking start is free");
        assert!(starts.contains(&(14, 50)));
        assert!(!starts.contains(&(14, 45)), "off-grid starts are never offered");
    }

    #[test]
    fn no_emitted_slot_overlaps_a_busy_interval() {
        let booking = booking_at(13, 0, 90, 15);
        let busy_start = booking.starts_at;
        let busy_end = booking.busy_until();
        let slots =
            generate_slots(&service(60, 15), day(), &[booking], &[], &cfg(), tz()).unwrap();

        for slot in &slots {
            assert!(
                slot.end <= busy_start || slot.start >= busy_end,
                "slot {:?} overlaps busy interval",
                slot
            );
        }
    }

    #[test]
    fn timeoff_window_removes_contained_starts_only() {
        let time_off = TimeOff::new(
            day(),
            Some(TimeOffWindow {
                start: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            }),
            Some("Lunch".into()),
        );
        let slots =
            generate_slots(&service(60, 15), day(), &[], &[time_off], &cfg(), tz()).unwrap();
        let starts = slot_starts(&slots);

        assert!(!starts.iter().any(|&(h, _)| (12..14).contains(&h)));
        assert!(starts.contains(&(11, 0)), "slot ending at the window start survives");
        assert!(starts.contains(&(14, 0)), "slot starting at the window end survives");
    }

    #[test]
    fn timeoff_without_window_blocks_nothing() {
        let time_off = TimeOff::new(day(), None, Some("admin day".into()));
        let free = generate_slots(&service(60, 15), day(), &[], &[], &cfg(), tz()).unwrap();
        let with_timeoff =
            generate_slots(&service(60, 15), day(), &[], &[time_off], &cfg(), tz()).unwrap();

        assert_eq!(free, with_timeoff);
    }

    #[test]
    fn service_longer_than_work_window_yields_no_slots() {
        let slots = generate_slots(&service(11 * 60, 0), day(), &[], &[], &cfg(), tz()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn uneven_grid_terminates_without_special_casing() {
        // 45-minute service on a 7-minute grid: the walk just stops once a
        // candidate would overrun the window.
        let odd = SchedulingConfig { grid_step_min: 7, ..cfg() };
        let slots = generate_slots(&service(45, 0), day(), &[], &[], &odd, tz()).unwrap();
        let last = slots.last().unwrap();

        assert!(last.end <= Utc.with_ymd_and_hms(2025, 9, 15, 20, 0, 0).unwrap());
        assert!(
            last.start + Duration::minutes(7) + Duration::minutes(45)
                > Utc.with_ymd_and_hms(2025, 9, 15, 20, 0, 0).unwrap()
        );
    }

    #[test]
    fn adjacent_bookings_leave_no_gap_slots() {
        let first = booking_at(10, 0, 60, 0);
        let second = booking_at(11, 0, 60, 0);
        let slots =
            generate_slots(&service(60, 0), day(), &[first, second], &[], &cfg(), tz()).unwrap();
        let starts = slot_starts(&slots);

        assert_eq!(starts.first(), Some(&(12, 0)));
    }

    #[test]
    fn invalid_grid_step_is_rejected() {
        let bad = SchedulingConfig { grid_step_min: 0, ..cfg() };
        assert!(generate_slots(&service(60, 0), day(), &[], &[], &bad, tz()).is_err());
    }
}
