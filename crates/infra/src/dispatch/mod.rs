//! Dispatch runtime: delivery timers, the channel-fed worker, and the
//! nightly sweep cron job.

pub mod delivery_scheduler;
pub mod error;
pub mod sweep_scheduler;
pub mod worker;

use std::sync::Arc;

use chrono_tz::Tz;
use slotline_core::{EventExecutor, NotificationTransport, OutboxDispatcher, OutboxStore};
use slotline_domain::DispatchConfig;
use tokio::sync::mpsc;

pub use delivery_scheduler::TokioDeliveryScheduler;
pub use error::{SchedulerError, SchedulerResult};
pub use sweep_scheduler::{SweepScheduler, SweepSchedulerConfig};
pub use worker::{DispatchWorker, DispatchWorkerConfig};

/// Wire up the dispatch pipeline: timer scheduler, dispatcher, and worker
/// share one channel, with the dispatcher doubling as the worker's executor.
///
/// The worker is returned unstarted so the caller controls its lifecycle.
pub fn build_dispatch(
    store: Arc<dyn OutboxStore>,
    transport: Arc<dyn NotificationTransport>,
    cfg: DispatchConfig,
    tz: Tz,
) -> (Arc<OutboxDispatcher>, Arc<TokioDeliveryScheduler>, DispatchWorker) {
    let (sender, receiver) = mpsc::unbounded_channel();

    let scheduler = Arc::new(TokioDeliveryScheduler::new(sender));
    let dispatcher =
        Arc::new(OutboxDispatcher::new(store, transport, scheduler.clone(), cfg, tz));
    let executor: Arc<dyn EventExecutor> = dispatcher.clone();
    let worker = DispatchWorker::new(executor, receiver, DispatchWorkerConfig::default());

    (dispatcher, scheduler, worker)
}
