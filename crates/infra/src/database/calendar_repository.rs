//! SQLite-backed implementation of the working-calendar port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Row};
use slotline_core::WorkCalendarRepository;
use slotline_domain::{DaysOff, Result, TimeOff, TimeOffWindow};
use tokio::task;

use super::manager::{map_sql_error, DbConnection, DbManager};
use super::rows::{date_from_iso, time_from_iso};
use crate::errors::map_join_error;

/// SQLite-backed working-calendar repository.
pub struct SqliteWorkCalendarRepository {
    db: Arc<DbManager>,
}

impl SqliteWorkCalendarRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn fetch_time_off(
        conn: &DbConnection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TimeOff>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, date, window_start, window_end, reason
                 FROM time_off
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY date ASC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], map_time_off_row)
            .map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }

    fn fetch_days_off(
        conn: &DbConnection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DaysOff>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, start_date, end_date, reason
                 FROM days_off
                 WHERE start_date <= ?2 AND end_date >= ?1
                 ORDER BY start_date ASC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![start.to_string(), end.to_string()], map_days_off_row)
            .map_err(map_sql_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
    }
}

#[async_trait]
impl WorkCalendarRepository for SqliteWorkCalendarRepository {
    async fn time_off_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<TimeOff>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<TimeOff>> {
            let conn = db.get_connection()?;
            Self::fetch_time_off(&conn, start, end)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn days_off_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DaysOff>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<DaysOff>> {
            let conn = db.get_connection()?;
            Self::fetch_days_off(&conn, start, end)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_time_off(&self, time_off: &TimeOff) -> Result<()> {
        time_off.validate()?;
        let db = Arc::clone(&self.db);
        let to_insert = time_off.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO time_off (id, date, window_start, window_end, reason)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    to_insert.id,
                    to_insert.date.to_string(),
                    to_insert.window.map(|w| w.start.to_string()),
                    to_insert.window.map(|w| w.end.to_string()),
                    to_insert.reason,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_days_off(&self, days_off: &DaysOff) -> Result<()> {
        days_off.validate()?;
        let db = Arc::clone(&self.db);
        let to_insert = days_off.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO days_off (id, start_date, end_date, reason)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    to_insert.id,
                    to_insert.start.to_string(),
                    to_insert.end.to_string(),
                    to_insert.reason,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_time_off_row(row: &Row<'_>) -> rusqlite::Result<TimeOff> {
    let date_raw: String = row.get(1)?;
    let window_start: Option<String> = row.get(2)?;
    let window_end: Option<String> = row.get(3)?;

    let window = match (window_start, window_end) {
        (Some(start), Some(end)) => Some(TimeOffWindow {
            start: time_from_iso(2, &start)?,
            end: time_from_iso(3, &end)?,
        }),
        _ => None,
    };

    Ok(TimeOff { id: row.get(0)?, date: date_from_iso(1, &date_raw)?, window, reason: row.get(4)? })
}

fn map_days_off_row(row: &Row<'_>) -> rusqlite::Result<DaysOff> {
    let start_raw: String = row.get(1)?;
    let end_raw: String = row.get(2)?;

    Ok(DaysOff {
        id: row.get(0)?,
        start: date_from_iso(1, &start_raw)?,
        end: date_from_iso(2, &end_raw)?,
        reason: row.get(3)?,
    })
}
