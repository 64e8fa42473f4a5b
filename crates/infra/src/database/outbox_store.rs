//! SQLite-backed implementation of the outbox store port.
//!
//! The processed flag transition is a compare-and-set: the UPDATE narrows on
//! `processed = 0` so exactly one of any number of racing triggers observes
//! a changed row count. This is what makes recorded delivery at-most-once.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use slotline_core::OutboxStore;
use slotline_domain::{OutboxEvent, OutboxEventType, Result};
use tokio::task;
use tracing::warn;

use super::manager::{map_sql_error, DbConnection, DbManager};
use super::rows::datetime_from_unix;
use crate::errors::map_join_error;

/// SQLite-backed outbox event store.
pub struct SqliteOutboxStore {
    db: Arc<DbManager>,
}

impl SqliteOutboxStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert(conn: &DbConnection, event: &OutboxEvent) -> Result<()> {
        conn.execute(
            OUTBOX_INSERT_SQL,
            params![
                event.id,
                event.event_type.to_string(),
                event.payload_json,
                event.execute_at.timestamp(),
                i32::from(event.processed),
                event.processed_at.map(|at| at.timestamp()),
                event.booking_id,
                event.delivery_handle,
                event.created_at.timestamp(),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    fn fetch_one(conn: &DbConnection, id: &str) -> Result<Option<OutboxEvent>> {
        let mut stmt = conn
            .prepare(&format!("{OUTBOX_SELECT_SQL} WHERE id = ?1"))
            .map_err(map_sql_error)?;
        let mut rows =
            stmt.query_map(params![id], map_event_row).map_err(map_sql_error)?;
        rows.next().transpose().map_err(map_sql_error)
    }
}

#[async_trait]
impl OutboxStore for SqliteOutboxStore {
    async fn create(&self, event: &OutboxEvent) -> Result<()> {
        let db = Arc::clone(&self.db);
        let to_insert = event.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            Self::insert(&conn, &to_insert)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, id: &str) -> Result<Option<OutboxEvent>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<Option<OutboxEvent>> {
            let conn = db.get_connection()?;
            Self::fetch_one(&conn, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_delivery_handle(&self, id: &str, handle: Option<&str>) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let handle = handle.map(str::to_string);

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE outbox_events SET delivery_handle = ?1 WHERE id = ?2",
                params![handle, id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn mark_processed(&self, id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    "UPDATE outbox_events
                     SET processed = 1, processed_at = ?1
                     WHERE id = ?2 AND processed = 0",
                    params![Utc::now().timestamp(), id],
                )
                .map_err(map_sql_error)?;
            Ok(updated == 1)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn unprocessed_for_booking(&self, booking_id: &str) -> Result<Vec<OutboxEvent>> {
        let db = Arc::clone(&self.db);
        let booking_id = booking_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<OutboxEvent>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "{OUTBOX_SELECT_SQL} WHERE booking_id = ?1 AND processed = 0
                     ORDER BY execute_at ASC"
                ))
                .map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![booking_id], map_event_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_for_booking(&self, booking_id: &str, only_unprocessed: bool) -> Result<usize> {
        let db = Arc::clone(&self.db);
        let booking_id = booking_id.to_string();

        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            let sql = if only_unprocessed {
                "DELETE FROM outbox_events WHERE booking_id = ?1 AND processed = 0"
            } else {
                "DELETE FROM outbox_events WHERE booking_id = ?1"
            };
            conn.execute(sql, params![booking_id]).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn unprocessed_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OutboxEvent>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<OutboxEvent>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!(
                    "{OUTBOX_SELECT_SQL}
                     WHERE processed = 0 AND execute_at >= ?1 AND execute_at < ?2
                     ORDER BY execute_at ASC"
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![start.timestamp(), end.timestamp()], map_event_row)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

const OUTBOX_INSERT_SQL: &str = "INSERT INTO outbox_events (
        id, event_type, payload_json, execute_at, processed, processed_at,
        booking_id, delivery_handle, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const OUTBOX_SELECT_SQL: &str = "SELECT
        id, event_type, payload_json, execute_at, processed, processed_at,
        booking_id, delivery_handle, created_at
    FROM outbox_events";

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<OutboxEvent> {
    let id: String = row.get(0)?;
    let type_raw: String = row.get(1)?;
    let event_type = parse_event_type(&id, &type_raw);
    let processed_at: Option<i64> = row.get(5)?;

    Ok(OutboxEvent {
        id,
        event_type,
        payload_json: row.get(2)?,
        execute_at: datetime_from_unix(3, row.get(3)?)?,
        processed: row.get::<_, i32>(4)? != 0,
        processed_at: processed_at.map(|at| datetime_from_unix(5, at)).transpose()?,
        booking_id: row.get(6)?,
        delivery_handle: row.get(7)?,
        created_at: datetime_from_unix(8, row.get(8)?)?,
    })
}

fn parse_event_type(id: &str, raw: &str) -> OutboxEventType {
    match OutboxEventType::from_str(raw) {
        Ok(event_type) => event_type,
        Err(err) => {
            warn!(
                event_id = %id,
                raw_type = %raw,
                error = %err,
                "invalid outbox event type in database, defaulting to client_notify"
            );
            OutboxEventType::ClientNotify
        }
    }
}
