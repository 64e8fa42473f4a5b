//! Outbox dispatcher: drives events from durable storage to the transport.
//!
//! Delivery semantics are at-least-once on the wire and at-most-once in the
//! record: the transport may be invoked more than once for an event under
//! races or crashes, but only one trigger wins the compare-and-set on the
//! processed flag. Revocation of scheduled timers is advisory; the processed
//! re-check inside [`OutboxDispatcher::deliver`] is the authoritative guard.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use slotline_domain::{DispatchConfig, OutboxEvent, Result, SlotlineError, SweepStats};
use tracing::{debug, error, info, instrument, warn};

use crate::outbox::ports::{
    DeliveryHandle, DeliveryScheduler, EventExecutor, NotificationTransport, OutboxStore,
};
use crate::outbox::retry::backoff_delay;
use crate::time::local_day_bounds;

pub struct OutboxDispatcher {
    store: Arc<dyn OutboxStore>,
    transport: Arc<dyn NotificationTransport>,
    scheduler: Arc<dyn DeliveryScheduler>,
    cfg: DispatchConfig,
    tz: Tz,
}

impl OutboxDispatcher {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        transport: Arc<dyn NotificationTransport>,
        scheduler: Arc<dyn DeliveryScheduler>,
        cfg: DispatchConfig,
        tz: Tz,
    ) -> Self {
        Self { store, transport, scheduler, cfg, tz }
    }

    /// Hand a persisted event to the timer layer: overdue events run
    /// immediately, future ones get a scheduled delivery whose handle is
    /// persisted for later revocation.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn register_delivery(&self, event: &OutboxEvent) -> Result<()> {
        self.register_delivery_at(event, Utc::now()).await
    }

    pub(crate) async fn register_delivery_at(
        &self,
        event: &OutboxEvent,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if event.execute_at <= now {
            self.scheduler.run_now(&event.id).await?;
            debug!(event_id = %event.id, "queued for immediate delivery");
        } else {
            let handle = self.scheduler.schedule_at(&event.id, event.execute_at).await?;
            self.store.set_delivery_handle(&event.id, Some(&handle.0)).await?;
            debug!(event_id = %event.id, %handle, eta = %event.execute_at, "scheduled delivery");
        }
        Ok(())
    }

    /// Deliver one event: load, re-check the processed flag, push through
    /// the transport with bounded retries, then compare-and-set processed.
    ///
    /// A missing or already-processed event is a no-op: stale timers and
    /// racing triggers land here by design. Exhausted retries leave the
    /// event unprocessed (the nightly sweep will pick it up) and surface an
    /// error so callers can alert.
    #[instrument(skip(self))]
    pub async fn deliver(&self, event_id: &str) -> Result<()> {
        let Some(event) = self.store.get(event_id).await? else {
            warn!(event_id, "delivery triggered for unknown event, skipping");
            return Ok(());
        };
        if event.processed {
            debug!(event_id, "event already processed, skipping");
            return Ok(());
        }

        self.send_with_retries(&event).await?;

        if self.store.mark_processed(event_id).await? {
            info!(event_id, event_type = %event.event_type, "event delivered");
        } else {
            // A concurrent trigger won the CAS after our transport call;
            // at-least-once on the wire, at-most-once in the record.
            debug!(event_id, "lost processed race to a concurrent trigger");
        }
        Ok(())
    }

    async fn send_with_retries(&self, event: &OutboxEvent) -> Result<()> {
        let timeout = StdDuration::from_secs(self.cfg.deliver_timeout_secs);
        let attempts = self.cfg.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let outcome = tokio::time::timeout(timeout, self.transport.send(event)).await;

            last_error = match outcome {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(err)) if !err.is_transient() => {
                    error!(event_id = %event.id, %err, "permanent delivery failure");
                    return Err(SlotlineError::Network(format!(
                        "permanent delivery failure for event {}: {err}",
                        event.id
                    )));
                }
                Ok(Err(err)) => err.to_string(),
                Err(_) => format!("transport timed out after {}s", self.cfg.deliver_timeout_secs),
            };

            if attempt < attempts {
                let delay = backoff_delay(attempt, &self.cfg);
                warn!(
                    event_id = %event.id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "transient delivery failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }

        error!(event_id = %event.id, attempts, error = %last_error, "delivery retries exhausted");
        Err(SlotlineError::Network(format!(
            "delivery of event {} failed after {attempts} attempts: {last_error}",
            event.id
        )))
    }

    /// Reconciliation sweep over the current business-local day.
    ///
    /// Re-arms deliveries lost to restarts: overdue events (past the grace
    /// window) are sent immediately, events still in the future today are
    /// re-registered at their exact ETA.
    #[instrument(skip(self))]
    pub async fn nightly_sweep(&self) -> Result<SweepStats> {
        self.sweep_at(Utc::now()).await
    }

    pub(crate) async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepStats> {
        let local_day = now.with_timezone(&self.tz).date_naive();
        let (day_start, day_end) = local_day_bounds(self.tz, local_day)?;
        let events = self.store.unprocessed_in_window(day_start, day_end).await?;
        let due_before = now - Duration::seconds(self.cfg.sweep_grace_secs);

        let mut stats = SweepStats::default();
        for event in &events {
            if event.execute_at <= due_before {
                match self.deliver(&event.id).await {
                    Ok(()) => stats.sent_now += 1,
                    Err(err) => {
                        warn!(event_id = %event.id, %err, "sweep delivery failed, leaving for next sweep");
                    }
                }
            } else {
                match self.register_delivery_at(event, now).await {
                    Ok(()) => stats.scheduled += 1,
                    Err(err) => {
                        warn!(event_id = %event.id, %err, "sweep scheduling failed, leaving for next sweep");
                    }
                }
            }
        }

        info!(scheduled = stats.scheduled, sent_now = stats.sent_now, "sweep complete");
        Ok(stats)
    }

    /// Revoke and delete the pending notifications of a cancelled booking.
    ///
    /// Revocation is best effort; deleting the unprocessed rows is what
    /// actually stops delivery, because `deliver` re-loads the event.
    /// Processed rows stay behind as an audit trail.
    #[instrument(skip(self))]
    pub async fn cancel_for_booking(&self, booking_id: &str) -> Result<usize> {
        for event in self.store.unprocessed_for_booking(booking_id).await? {
            let Some(handle) = event.delivery_handle else { continue };
            match self.scheduler.revoke(&DeliveryHandle(handle)).await {
                Ok(true) => {}
                Ok(false) => debug!(event_id = %event.id, "revoke missed, timer already fired"),
                Err(err) => warn!(event_id = %event.id, %err, "revoke failed"),
            }
        }
        let deleted = self.store.delete_for_booking(booking_id, true).await?;
        info!(booking_id, deleted, "cancelled pending notifications");
        Ok(deleted)
    }

    /// Remove every event correlated with a hard-deleted booking, processed
    /// or not. No revocation: a fired timer finds no row and no-ops.
    #[instrument(skip(self))]
    pub async fn purge_for_booking(&self, booking_id: &str) -> Result<usize> {
        self.store.delete_for_booking(booking_id, false).await
    }
}

#[async_trait]
impl EventExecutor for OutboxDispatcher {
    async fn execute(&self, event_id: &str) {
        if let Err(err) = self.deliver(event_id).await {
            error!(event_id, %err, "scheduled delivery failed");
        }
    }
}
