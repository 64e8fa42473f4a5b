//! Port interfaces for outbox persistence, delivery transport, and timer
//! scheduling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotline_domain::{DeliveryError, OutboxEvent, Result};

/// Opaque identifier of a registered future delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeliveryHandle(pub String);

impl std::fmt::Display for DeliveryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable storage for outbox events.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn create(&self, event: &OutboxEvent) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<OutboxEvent>>;

    /// Record the scheduler handle of an in-flight delivery
    async fn set_delivery_handle(&self, id: &str, handle: Option<&str>) -> Result<()>;

    /// Compare-and-set the processed flag.
    ///
    /// Returns `true` if this call transitioned the event from unprocessed
    /// to processed, `false` if another trigger got there first. The store
    /// must make the transition atomic.
    async fn mark_processed(&self, id: &str) -> Result<bool>;

    /// Unprocessed events correlated with a booking
    async fn unprocessed_for_booking(&self, booking_id: &str) -> Result<Vec<OutboxEvent>>;

    /// Delete events correlated with a booking, returning the count.
    ///
    /// With `only_unprocessed` set, processed rows are kept as an audit
    /// trail.
    async fn delete_for_booking(&self, booking_id: &str, only_unprocessed: bool) -> Result<usize>;

    /// Unprocessed events with `execute_at` within `[start, end)`, ordered
    /// by `execute_at`. Used by the nightly sweep.
    async fn unprocessed_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OutboxEvent>>;
}

/// Side-effecting notification channel (SMS, email, chat webhook).
///
/// Delivery is at-least-once: a transport call may succeed without the
/// caller observing it, so implementations must tolerate duplicates.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, event: &OutboxEvent) -> std::result::Result<(), DeliveryError>;
}

/// Timer facility for future deliveries.
#[async_trait]
pub trait DeliveryScheduler: Send + Sync {
    /// Arrange for the event to be executed at `execute_at`
    async fn schedule_at(
        &self,
        event_id: &str,
        execute_at: DateTime<Utc>,
    ) -> Result<DeliveryHandle>;

    /// Arrange for the event to be executed immediately
    async fn run_now(&self, event_id: &str) -> Result<()>;

    /// Cancel a previously scheduled delivery.
    ///
    /// Best effort: returns `false` when the task already fired or the
    /// handle is unknown. The processed flag, not revocation, is the
    /// authoritative duplicate guard.
    async fn revoke(&self, handle: &DeliveryHandle) -> Result<bool>;
}

/// Callback through which scheduled timers re-enter the dispatcher.
#[async_trait]
pub trait EventExecutor: Send + Sync {
    /// Deliver the event, swallowing errors after logging them. Timer wakeups
    /// have no caller to report to.
    async fn execute(&self, event_id: &str);
}
