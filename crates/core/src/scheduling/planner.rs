//! Day- and slot-level availability queries over the repositories.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use slotline_domain::{Booking, Result, SchedulingConfig, ServiceProfile, Slot, TimeOff};
use tracing::{debug, instrument};

use crate::scheduling::ports::{BookingRepository, WorkCalendarRepository};
use crate::scheduling::slots::generate_slots;
use crate::scheduling::visibility::occupies_slot;
use crate::time::local_day_bounds;

/// Read-side availability planner.
///
/// Both queries share one slot-generation path so a day reported as
/// available always has at least one bookable slot, and both load their
/// inputs with range queries rather than per-day round trips.
pub struct AvailabilityService {
    bookings: Arc<dyn BookingRepository>,
    calendar: Arc<dyn WorkCalendarRepository>,
    cfg: SchedulingConfig,
    tz: Tz,
}

impl AvailabilityService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        calendar: Arc<dyn WorkCalendarRepository>,
        cfg: SchedulingConfig,
        tz: Tz,
    ) -> Self {
        Self { bookings, calendar, cfg, tz }
    }

    /// Days within the configured horizon (starting at `from_day`) that have
    /// at least one free slot for `service`.
    #[instrument(skip(self, service), fields(service = %service.name))]
    pub async fn available_days(
        &self,
        service: &ServiceProfile,
        from_day: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        self.available_days_at(service, from_day, Utc::now()).await
    }

    /// Free slots for `service` on a single day, in ascending order.
    #[instrument(skip(self, service), fields(service = %service.name))]
    pub async fn available_slots(
        &self,
        service: &ServiceProfile,
        day: NaiveDate,
    ) -> Result<Vec<Slot>> {
        self.available_slots_at(service, day, Utc::now()).await
    }

    pub(crate) async fn available_days_at(
        &self,
        service: &ServiceProfile,
        from_day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<NaiveDate>> {
        let horizon = self.horizon(from_day)?;
        let (range_start, _) = local_day_bounds(self.tz, from_day)?;
        let (_, range_end) = local_day_bounds(self.tz, horizon)?;

        let bookings = self.bookings.list_in_range(range_start, range_end).await?;
        let timeoffs = self.calendar.time_off_in_range(from_day, horizon).await?;
        let closures = self.calendar.days_off_overlapping(from_day, horizon).await?;

        let bookings_by_day = self.group_by_local_day(bookings, now);
        let mut timeoffs_by_day: HashMap<NaiveDate, Vec<TimeOff>> = HashMap::new();
        for time_off in timeoffs {
            timeoffs_by_day.entry(time_off.date).or_default().push(time_off);
        }

        let mut days = Vec::new();
        let mut day = from_day;
        while day <= horizon {
            let open = self.is_open(day, &closures)
                && !generate_slots(
                    service,
                    day,
                    bookings_by_day.get(&day).map_or(&[][..], Vec::as_slice),
                    timeoffs_by_day.get(&day).map_or(&[][..], Vec::as_slice),
                    &self.cfg,
                    self.tz,
                )?
                .is_empty();
            if open {
                days.push(day);
            }
            day = day
                .succ_opt()
                .ok_or_else(|| slotline_domain::SlotlineError::Internal("date overflow".into()))?;
        }

        debug!(available = days.len(), "computed day-level availability");
        Ok(days)
    }

    pub(crate) async fn available_slots_at(
        &self,
        service: &ServiceProfile,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        let closures = self.calendar.days_off_overlapping(day, day).await?;
        if !self.is_open(day, &closures) {
            return Ok(Vec::new());
        }

        let (day_start, day_end) = local_day_bounds(self.tz, day)?;
        let bookings: Vec<Booking> = self
            .bookings
            .list_in_range(day_start, day_end)
            .await?
            .into_iter()
            .filter(|b| occupies_slot(b, now, &self.cfg))
            .collect();
        let timeoffs = self.calendar.time_off_in_range(day, day).await?;

        generate_slots(service, day, &bookings, &timeoffs, &self.cfg, self.tz)
    }

    /// Sundays and closure days are never bookable.
    fn is_open(&self, day: NaiveDate, closures: &[slotline_domain::DaysOff]) -> bool {
        day.weekday() != Weekday::Sun && !closures.iter().any(|c| c.contains(day))
    }

    fn horizon(&self, from_day: NaiveDate) -> Result<NaiveDate> {
        from_day
            .checked_add_signed(Duration::days(i64::from(self.cfg.days_ahead.saturating_sub(1))))
            .ok_or_else(|| {
                slotline_domain::SlotlineError::InvalidInput(format!(
                    "horizon overflows past {from_day}"
                ))
            })
    }

    fn group_by_local_day(
        &self,
        bookings: Vec<Booking>,
        now: DateTime<Utc>,
    ) -> HashMap<NaiveDate, Vec<Booking>> {
        let mut by_day: HashMap<NaiveDate, Vec<Booking>> = HashMap::new();
        for booking in bookings {
            if !occupies_slot(&booking, now, &self.cfg) {
                continue;
            }
            let local_day = booking.starts_at.with_timezone(&self.tz).date_naive();
            by_day.entry(local_day).or_default().push(booking);
        }
        by_day
    }
}
