//! Tokio-timer implementation of the delivery scheduler port.
//!
//! Each scheduled delivery is one sleeping task keyed by a fresh uuid
//! handle. On wake the task forwards its event id onto the dispatch channel
//! and deregisters itself; revocation cancels the task before it fires.
//! Revocation is best effort only: the processed re-check in the dispatcher
//! is what actually prevents duplicate sends.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotline_core::{DeliveryHandle, DeliveryScheduler};
use slotline_domain::{Result, SlotlineError};
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

struct ScheduledTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Delivery scheduler backed by per-event tokio sleep tasks.
pub struct TokioDeliveryScheduler {
    sender: mpsc::UnboundedSender<String>,
    tasks: Arc<TokioMutex<HashMap<String, ScheduledTask>>>,
}

impl TokioDeliveryScheduler {
    /// Create a scheduler that feeds the given dispatch channel.
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender, tasks: Arc::new(TokioMutex::new(HashMap::new())) }
    }

    /// Number of deliveries currently waiting on their timer.
    pub async fn pending_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Cancel every outstanding timer, e.g. on shutdown.
    pub async fn cancel_all(&self) {
        let mut tasks = self.tasks.lock().await;
        for (_, task) in tasks.drain() {
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}

#[async_trait]
impl DeliveryScheduler for TokioDeliveryScheduler {
    async fn schedule_at(
        &self,
        event_id: &str,
        execute_at: DateTime<Utc>,
    ) -> Result<DeliveryHandle> {
        let handle_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();

        let delay = (execute_at - Utc::now()).to_std().unwrap_or_default();
        let sender = self.sender.clone();
        let tasks = Arc::clone(&self.tasks);
        let task_cancel = cancel.clone();
        let task_event_id = event_id.to_string();
        let task_handle_id = handle_id.clone();

        let join_handle = tokio::spawn(async move {
            tokio::select! {
                () = task_cancel.cancelled() => {
                    debug!(event_id = %task_event_id, "scheduled delivery revoked");
                }
                () = tokio::time::sleep(delay) => {
                    // Deregister before forwarding so a concurrent revoke
                    // observes the fired state.
                    tasks.lock().await.remove(&task_handle_id);
                    if sender.send(task_event_id.clone()).is_err() {
                        debug!(event_id = %task_event_id, "dispatch channel closed, dropping wakeup");
                    }
                }
            }
        });

        self.tasks
            .lock()
            .await
            .insert(handle_id.clone(), ScheduledTask { cancel, handle: join_handle });

        Ok(DeliveryHandle(handle_id))
    }

    async fn run_now(&self, event_id: &str) -> Result<()> {
        self.sender
            .send(event_id.to_string())
            .map_err(|_| SlotlineError::Internal("dispatch channel closed".into()))
    }

    async fn revoke(&self, handle: &DeliveryHandle) -> Result<bool> {
        match self.tasks.lock().await.remove(&handle.0) {
            Some(task) => {
                task.cancel.cancel();
                Ok(true)
            }
            // Already fired (the task removed itself) or never existed.
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn run_now_forwards_to_channel() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = TokioDeliveryScheduler::new(sender);

        scheduler.run_now("evt-1").await.unwrap();

        assert_eq!(receiver.recv().await.as_deref(), Some("evt-1"));
    }

    #[tokio::test]
    async fn past_eta_fires_immediately() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = TokioDeliveryScheduler::new(sender);

        scheduler.schedule_at("evt-1", Utc::now() - Duration::minutes(1)).await.unwrap();

        let received =
            tokio::time::timeout(std::time::Duration::from_secs(1), receiver.recv()).await;
        assert_eq!(received.unwrap().as_deref(), Some("evt-1"));
    }

    #[tokio::test]
    async fn revoked_delivery_never_fires() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = TokioDeliveryScheduler::new(sender);

        let handle =
            scheduler.schedule_at("evt-1", Utc::now() + Duration::seconds(30)).await.unwrap();
        assert!(scheduler.revoke(&handle).await.unwrap());

        let received =
            tokio::time::timeout(std::time::Duration::from_millis(100), receiver.recv()).await;
        assert!(received.is_err(), "revoked timer must not deliver");
        assert!(!scheduler.revoke(&handle).await.unwrap(), "second revoke misses");
    }

    #[tokio::test]
    async fn cancel_all_clears_every_outstanding_timer() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = TokioDeliveryScheduler::new(sender);

        scheduler.schedule_at("evt-1", Utc::now() + Duration::seconds(30)).await.unwrap();
        scheduler.schedule_at("evt-2", Utc::now() + Duration::seconds(60)).await.unwrap();
        assert_eq!(scheduler.pending_count().await, 2);

        scheduler.cancel_all().await;

        assert_eq!(scheduler.pending_count().await, 0);
        let received =
            tokio::time::timeout(std::time::Duration::from_millis(100), receiver.recv()).await;
        assert!(received.is_err(), "shutdown must not deliver pending timers");
    }

    #[tokio::test]
    async fn fired_delivery_deregisters_itself() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let scheduler = TokioDeliveryScheduler::new(sender);

        let handle =
            scheduler.schedule_at("evt-1", Utc::now() + Duration::milliseconds(10)).await.unwrap();
        receiver.recv().await.unwrap();

        assert_eq!(scheduler.pending_count().await, 0);
        assert!(!scheduler.revoke(&handle).await.unwrap());
    }
}
