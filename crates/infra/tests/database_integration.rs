//! Integration tests for the booking and working-calendar repositories.

mod support;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use slotline_core::{BookingRepository, WorkCalendarRepository};
use slotline_domain::{
    Booking, BookingStatus, DaysOff, ServiceProfile, SlotlineError, TimeOff, TimeOffWindow,
};
use slotline_infra::{SqliteBookingRepository, SqliteWorkCalendarRepository};
use support::TestDatabase;

fn service() -> ServiceProfile {
    ServiceProfile {
        id: "svc-1".into(),
        name: "Manicure".into(),
        duration_min: 60,
        buffer_after_min: 15,
    }
}

fn booking_at(hour: u32) -> Booking {
    let start = Utc.with_ymd_and_hms(2025, 9, 15, hour, 0, 0).unwrap();
    Booking::new("Dana", "+4912345", "dana@example.com", service(), start, start + Duration::minutes(60))
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
}

#[tokio::test]
async fn booking_roundtrip_preserves_all_fields() {
    let db = TestDatabase::new();
    let repo = SqliteBookingRepository::new(Arc::clone(&db.manager));

    let mut booking = booking_at(14);
    booking.notes = "prefers window seat".into();
    repo.create(&booking).await.unwrap();

    let range_start = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
    let range_end = Utc.with_ymd_and_hms(2025, 9, 16, 0, 0, 0).unwrap();
    let loaded = repo.list_in_range(range_start, range_end).await.unwrap();

    assert_eq!(loaded.len(), 1);
    let got = &loaded[0];
    assert_eq!(got.id, booking.id);
    assert_eq!(got.customer_name, "Dana");
    assert_eq!(got.service, booking.service);
    assert_eq!(got.starts_at, booking.starts_at);
    assert_eq!(got.status, BookingStatus::Pending);
    assert_eq!(got.notes, "prefers window seat");
}

#[tokio::test]
async fn duplicate_start_instant_is_rejected() {
    let db = TestDatabase::new();
    let repo = SqliteBookingRepository::new(Arc::clone(&db.manager));

    repo.create(&booking_at(14)).await.unwrap();
    let err = repo.create(&booking_at(14)).await.unwrap_err();

    assert!(matches!(err, SlotlineError::InvalidInput(_)));
    assert!(err.to_string().contains("already booked"));
}

#[tokio::test]
async fn inverted_interval_is_rejected_before_reaching_sqlite() {
    let db = TestDatabase::new();
    let repo = SqliteBookingRepository::new(Arc::clone(&db.manager));

    let mut booking = booking_at(14);
    booking.ends_at = booking.starts_at;

    assert!(matches!(
        repo.create(&booking).await.unwrap_err(),
        SlotlineError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn range_query_is_half_open_and_ordered() {
    let db = TestDatabase::new();
    let repo = SqliteBookingRepository::new(Arc::clone(&db.manager));

    repo.create(&booking_at(16)).await.unwrap();
    repo.create(&booking_at(10)).await.unwrap();
    repo.create(&booking_at(13)).await.unwrap();

    let start = Utc.with_ymd_and_hms(2025, 9, 15, 10, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 9, 15, 16, 0, 0).unwrap();
    let loaded = repo.list_in_range(start, end).await.unwrap();

    // The 16:00 booking sits exactly on the exclusive upper bound.
    let hours: Vec<i64> = loaded.iter().map(|b| (b.starts_at - start).num_hours()).collect();
    assert_eq!(hours, vec![0, 3]);
}

#[tokio::test]
async fn set_status_updates_and_missing_id_is_not_found() {
    let db = TestDatabase::new();
    let repo = SqliteBookingRepository::new(Arc::clone(&db.manager));

    let booking = booking_at(14);
    repo.create(&booking).await.unwrap();
    repo.set_status(&booking.id, BookingStatus::Confirmed).await.unwrap();

    let start = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
    let loaded = repo.list_in_range(start, start + Duration::days(1)).await.unwrap();
    assert_eq!(loaded[0].status, BookingStatus::Confirmed);

    assert!(matches!(
        repo.set_status("ghost", BookingStatus::Cancelled).await.unwrap_err(),
        SlotlineError::NotFound(_)
    ));
}

#[tokio::test]
async fn reap_deletes_only_stale_pending_rows() {
    let db = TestDatabase::new();
    let repo = SqliteBookingRepository::new(Arc::clone(&db.manager));

    let now = Utc::now();

    let mut stale_pending = booking_at(10);
    stale_pending.created_at = now - Duration::minutes(30);
    let mut stale_confirmed = booking_at(12);
    stale_confirmed.created_at = now - Duration::minutes(30);
    stale_confirmed.status = BookingStatus::Confirmed;
    let fresh_pending = booking_at(14);

    repo.create(&stale_pending).await.unwrap();
    repo.create(&stale_confirmed).await.unwrap();
    repo.create(&fresh_pending).await.unwrap();

    let reaped = repo.reap_stale_pending(now - Duration::minutes(15)).await.unwrap();
    assert_eq!(reaped, 1);

    let start = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
    let remaining = repo.list_in_range(start, start + Duration::days(1)).await.unwrap();
    let ids: Vec<&str> = remaining.iter().map(|b| b.id.as_str()).collect();
    assert!(ids.contains(&stale_confirmed.id.as_str()));
    assert!(ids.contains(&fresh_pending.id.as_str()));
    assert!(!ids.contains(&stale_pending.id.as_str()));
}

#[tokio::test]
async fn time_off_roundtrip_with_and_without_window() {
    let db = TestDatabase::new();
    let repo = SqliteWorkCalendarRepository::new(Arc::clone(&db.manager));

    let windowed = TimeOff::new(
        date(15),
        Some(TimeOffWindow {
            start: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        }),
        Some("Lunch".into()),
    );
    let bare = TimeOff::new(date(16), None, None);
    repo.add_time_off(&windowed).await.unwrap();
    repo.add_time_off(&bare).await.unwrap();

    let loaded = repo.time_off_in_range(date(15), date(16)).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0], windowed);
    assert_eq!(loaded[1], bare);

    // Range bounds are inclusive on dates.
    let only_first = repo.time_off_in_range(date(15), date(15)).await.unwrap();
    assert_eq!(only_first.len(), 1);
}

#[tokio::test]
async fn inverted_time_off_window_is_rejected() {
    let db = TestDatabase::new();
    let repo = SqliteWorkCalendarRepository::new(Arc::clone(&db.manager));

    let inverted = TimeOff::new(
        date(15),
        Some(TimeOffWindow {
            start: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        }),
        None,
    );

    assert!(matches!(
        repo.add_time_off(&inverted).await.unwrap_err(),
        SlotlineError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn days_off_overlap_query_matches_partial_ranges() {
    let db = TestDatabase::new();
    let repo = SqliteWorkCalendarRepository::new(Arc::clone(&db.manager));

    repo.add_days_off(&DaysOff::new(date(10), date(16), Some("holiday".into()))).await.unwrap();
    repo.add_days_off(&DaysOff::new(date(20), date(20), None)).await.unwrap();

    let overlapping = repo.days_off_overlapping(date(15), date(19)).await.unwrap();
    assert_eq!(overlapping.len(), 1);
    assert_eq!(overlapping[0].start, date(10));

    let both = repo.days_off_overlapping(date(16), date(20)).await.unwrap();
    assert_eq!(both.len(), 2);

    let none = repo.days_off_overlapping(date(17), date(19)).await.unwrap();
    assert!(none.is_empty());
}
