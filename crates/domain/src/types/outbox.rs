//! Outbox event types for transactional notification delivery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// Kind of notification obligation carried by an outbox event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxEventType {
    MasterNotify,
    ClientNotify,
    ClientReminder,
}

impl_domain_status_conversions!(OutboxEventType {
    MasterNotify => "master_notify",
    ClientNotify => "client_notify",
    ClientReminder => "client_reminder"
});

/// A durable record representing the obligation to deliver one notification
/// at a specific instant.
///
/// Processing is idempotent: once `processed` is set the event is inert and
/// any further delivery trigger is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: String,
    pub event_type: OutboxEventType,
    /// JSON snapshot of everything the transport needs to render the
    /// notification
    pub payload_json: String,
    pub execute_at: DateTime<Utc>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    /// Originating booking, used to cancel events when the booking goes away
    pub booking_id: Option<String>,
    /// Opaque handle of an in-flight scheduled delivery, if one is registered
    pub delivery_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OutboxEvent {
    pub fn new(
        event_type: OutboxEventType,
        payload_json: String,
        execute_at: DateTime<Utc>,
        booking_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            payload_json,
            execute_at,
            processed: false,
            processed_at: None,
            booking_id,
            delivery_handle: None,
            created_at: Utc::now(),
        }
    }
}

/// Counters reported by a nightly reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepStats {
    /// Events registered for a same-day future delivery
    pub scheduled: usize,
    /// Overdue events dispatched immediately
    pub sent_now: usize,
}
