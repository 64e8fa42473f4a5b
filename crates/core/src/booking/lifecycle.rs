//! Translates booking state transitions into outbox events.
//!
//! The hooks run on the booking mutation path and must never fail it: the
//! event rows are the durable source of truth, and anything that goes wrong
//! after persisting them is repaired by the nightly sweep. Dispatch errors
//! are therefore logged, not propagated.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde_json::json;
use slotline_domain::{Booking, OutboxEvent, OutboxEventType, Result};
use tracing::{error, info, instrument, warn};

use crate::outbox::dispatcher::OutboxDispatcher;
use crate::outbox::ports::OutboxStore;

/// Minutes before the appointment start at which the client reminder fires.
const REMINDER_OFFSET_MIN: i64 = slotline_domain::constants::REMINDER_OFFSET_MIN;

pub struct BookingLifecycle {
    store: Arc<dyn OutboxStore>,
    dispatcher: Arc<OutboxDispatcher>,
    tz: Tz,
}

impl BookingLifecycle {
    pub fn new(store: Arc<dyn OutboxStore>, dispatcher: Arc<OutboxDispatcher>, tz: Tz) -> Self {
        Self { store, dispatcher, tz }
    }

    /// A booking was confirmed: persist its three notification obligations
    /// and arm their deliveries.
    ///
    /// The reminder is only armed when its ETA falls on the current business
    /// day and is still in the future; reminders for later days belong to
    /// that day's sweep, which re-arms them with a fresh timer after any
    /// restart in between.
    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    pub async fn on_confirmed(&self, booking: &Booking) {
        self.on_confirmed_at(booking, Utc::now()).await;
    }

    pub(crate) async fn on_confirmed_at(&self, booking: &Booking, now: DateTime<Utc>) {
        let payload = payload_snapshot(booking, self.tz);
        let remind_at = booking.starts_at - Duration::minutes(REMINDER_OFFSET_MIN);

        let events = [
            OutboxEvent::new(
                OutboxEventType::MasterNotify,
                payload.clone(),
                now,
                Some(booking.id.clone()),
            ),
            OutboxEvent::new(
                OutboxEventType::ClientNotify,
                payload.clone(),
                now,
                Some(booking.id.clone()),
            ),
            OutboxEvent::new(
                OutboxEventType::ClientReminder,
                payload,
                remind_at,
                Some(booking.id.clone()),
            ),
        ];

        for event in events {
            if let Err(err) = self.persist_and_arm(&event, now).await {
                error!(
                    booking_id = %booking.id,
                    event_type = %event.event_type,
                    %err,
                    "failed to set up notification, sweep will reconcile"
                );
            }
        }
    }

    async fn persist_and_arm(&self, event: &OutboxEvent, now: DateTime<Utc>) -> Result<()> {
        self.store.create(event).await?;

        let arm_now = match event.event_type {
            OutboxEventType::ClientReminder => {
                let same_day = event.execute_at.with_timezone(&self.tz).date_naive()
                    == now.with_timezone(&self.tz).date_naive();
                same_day && event.execute_at > now
            }
            _ => true,
        };

        if arm_now {
            self.dispatcher.register_delivery_at(event, now).await?;
        } else {
            info!(event_id = %event.id, eta = %event.execute_at, "reminder left for its day's sweep");
        }
        Ok(())
    }

    /// A booking was cancelled: revoke and delete its pending notifications.
    #[instrument(skip(self))]
    pub async fn on_cancelled(&self, booking_id: &str) {
        if let Err(err) = self.dispatcher.cancel_for_booking(booking_id).await {
            warn!(booking_id, %err, "failed to cancel pending notifications");
        }
    }

    /// A booking was hard-deleted: drop every correlated event, processed
    /// included.
    #[instrument(skip(self))]
    pub async fn on_deleted(&self, booking_id: &str) {
        match self.dispatcher.purge_for_booking(booking_id).await {
            Ok(deleted) => info!(booking_id, deleted, "purged notification events"),
            Err(err) => warn!(booking_id, %err, "failed to purge notification events"),
        }
    }
}

/// JSON snapshot of everything a transport needs to render any of the three
/// notifications, captured at confirmation time so later booking edits do
/// not rewrite history.
fn payload_snapshot(booking: &Booking, tz: Tz) -> String {
    let local_start = booking.starts_at.with_timezone(&tz);
    json!({
        "booking_id": booking.id,
        "service_id": booking.service.id,
        "service_name": booking.service.name,
        "customer_name": booking.customer_name,
        "customer_phone": booking.customer_phone,
        "customer_email": booking.customer_email,
        "starts_at": booking.starts_at.to_rfc3339(),
        "date": local_start.date_naive().to_string(),
        "time": local_start.time().format("%H:%M").to_string(),
        "duration_min": booking.service.duration_min,
    })
    .to_string()
}
