//! SQLite-backed implementation of the booking repository port.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::ffi::ErrorCode;
use rusqlite::{params, Row};
use slotline_core::BookingRepository;
use slotline_domain::{Booking, BookingStatus, Result, ServiceProfile, SlotlineError};
use tokio::task;
use tracing::warn;

use super::manager::{map_sql_error, DbConnection, DbManager};
use super::rows::datetime_from_unix;
use crate::errors::map_join_error;

/// SQLite-backed booking repository.
pub struct SqliteBookingRepository {
    db: Arc<DbManager>,
}

impl SqliteBookingRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert(conn: &DbConnection, booking: &Booking) -> Result<()> {
        booking.validate()?;
        conn.execute(
            BOOKING_INSERT_SQL,
            params![
                booking.id,
                booking.customer_name,
                booking.customer_phone,
                booking.customer_email,
                booking.service.id,
                booking.service.name,
                booking.service.duration_min,
                booking.service.buffer_after_min,
                booking.starts_at.timestamp(),
                booking.ends_at.timestamp(),
                booking.status.to_string(),
                booking.notes,
                booking.created_at.timestamp(),
            ],
        )
        .map_err(map_insert_error)?;
        Ok(())
    }

    fn fetch_range(
        conn: &DbConnection,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let mut stmt = conn.prepare(BOOKING_RANGE_SQL).map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![start.timestamp(), end.timestamp()], map_booking_row)
            .map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: &Booking) -> Result<()> {
        let db = Arc::clone(&self.db);
        let to_insert = booking.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            Self::insert(&conn, &to_insert)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<Booking>> {
            let conn = db.get_connection()?;
            Self::fetch_range(&conn, start, end)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_status(&self, id: &str, status: BookingStatus) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE bookings SET status = ?1 WHERE id = ?2",
                    params![status.to_string(), id],
                )
                .map_err(map_sql_error)?;
            if updated == 0 {
                return Err(SlotlineError::NotFound(format!("booking {id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let deleted = conn
                .execute("DELETE FROM bookings WHERE id = ?1", params![id])
                .map_err(map_sql_error)?;
            if deleted == 0 {
                return Err(SlotlineError::NotFound(format!("booking {id} not found")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn reap_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            conn.execute(
                "DELETE FROM bookings WHERE status = 'pending' AND created_at < ?1",
                params![cutoff.timestamp()],
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

const BOOKING_INSERT_SQL: &str = "INSERT INTO bookings (
        id, customer_name, customer_phone, customer_email, service_id, service_name,
        service_duration_min, service_buffer_after_min, starts_at, ends_at, status,
        notes, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

const BOOKING_RANGE_SQL: &str = "SELECT
        id, customer_name, customer_phone, customer_email, service_id, service_name,
        service_duration_min, service_buffer_after_min, starts_at, ends_at, status,
        notes, created_at
    FROM bookings
    WHERE starts_at >= ?1 AND starts_at < ?2
    ORDER BY starts_at ASC";

fn map_booking_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let id: String = row.get(0)?;
    let status_raw: String = row.get(10)?;
    let status = parse_status(&id, &status_raw);

    Ok(Booking {
        id,
        customer_name: row.get(1)?,
        customer_phone: row.get(2)?,
        customer_email: row.get(3)?,
        service: ServiceProfile {
            id: row.get(4)?,
            name: row.get(5)?,
            duration_min: row.get(6)?,
            buffer_after_min: row.get(7)?,
        },
        starts_at: datetime_from_unix(8, row.get(8)?)?,
        ends_at: datetime_from_unix(9, row.get(9)?)?,
        status,
        notes: row.get(11)?,
        created_at: datetime_from_unix(12, row.get(12)?)?,
    })
}

fn parse_status(id: &str, raw: &str) -> BookingStatus {
    match BookingStatus::from_str(raw) {
        Ok(status) => status,
        Err(err) => {
            warn!(
                booking_id = %id,
                raw_status = %raw,
                error = %err,
                "invalid booking status in database, defaulting to pending"
            );
            BookingStatus::Pending
        }
    }
}

/// A unique violation on `starts_at` means a racing write took the slot.
fn map_insert_error(err: rusqlite::Error) -> SlotlineError {
    if let rusqlite::Error::SqliteFailure(code, _) = &err {
        if code.code == ErrorCode::ConstraintViolation && code.extended_code == 2067 {
            return SlotlineError::InvalidInput("time slot already booked".into());
        }
    }
    map_sql_error(err)
}
