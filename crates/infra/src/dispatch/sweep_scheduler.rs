//! Cron-based nightly sweep scheduler.
//!
//! Runs the dispatcher's reconciliation sweep on a cron schedule (midnight
//! by default). Join handles are tracked, cancellation is explicit, and the
//! sweep itself is wrapped in a timeout with a bounded number of retries so
//! a transient database hiccup at midnight does not lose the day's
//! reminders.

use std::sync::Arc;
use std::time::Duration;

use slotline_core::OutboxDispatcher;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};

use crate::dispatch::error::{SchedulerError, SchedulerResult};

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepSchedulerConfig {
    /// Cron expression describing when the sweep runs.
    pub cron_expression: String,
    /// Timeout for one sweep attempt
    pub job_timeout: Duration,
    /// Sweep attempts per trigger before giving up until the next trigger
    pub max_attempts: u32,
    /// Delay between sweep attempts, multiplied by the attempt number
    pub retry_delay: Duration,
    /// Timeout for starting the underlying cron runtime
    pub start_timeout: Duration,
    /// Timeout for stopping the underlying cron runtime
    pub stop_timeout: Duration,
}

impl Default for SweepSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 0 0 * * *".into(),
            job_timeout: Duration::from_secs(300),
            max_attempts: 3,
            retry_delay: Duration::from_secs(30),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Nightly sweep scheduler with explicit lifecycle management.
pub struct SweepScheduler {
    scheduler: Option<JobScheduler>,
    config: SweepSchedulerConfig,
    dispatcher: Arc<OutboxDispatcher>,
}

impl SweepScheduler {
    pub fn new(dispatcher: Arc<OutboxDispatcher>, config: SweepSchedulerConfig) -> Self {
        Self { scheduler: None, config, dispatcher }
    }

    /// Start the cron runtime with the sweep job registered.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?
            .map_err(|err| SchedulerError::StartFailed(err.to_string()))?;

        self.scheduler = Some(scheduler_instance);
        info!(cron = %self.config.cron_expression, "sweep scheduler started");
        Ok(())
    }

    /// Stop the cron runtime.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
            .map_err(|err| SchedulerError::StopFailed(err.to_string()))?;

        info!("sweep scheduler stopped");
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|err| SchedulerError::CreationFailed(err.to_string()))?;

        let dispatcher = Arc::clone(&self.dispatcher);
        let job_timeout = self.config.job_timeout;
        let max_attempts = self.config.max_attempts;
        let retry_delay = self.config.retry_delay;

        let job = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                Self::run_sweep(dispatcher, job_timeout, max_attempts, retry_delay).await;
            })
        })
        .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;

        let job_id = job.guid();
        scheduler
            .add(job)
            .await
            .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "registered sweep job");
        Ok(scheduler)
    }

    async fn run_sweep(
        dispatcher: Arc<OutboxDispatcher>,
        job_timeout: Duration,
        max_attempts: u32,
        retry_delay: Duration,
    ) {
        for attempt in 1..=max_attempts.max(1) {
            match tokio::time::timeout(job_timeout, dispatcher.nightly_sweep()).await {
                Ok(Ok(stats)) => {
                    info!(
                        scheduled = stats.scheduled,
                        sent_now = stats.sent_now,
                        "nightly sweep finished"
                    );
                    return;
                }
                Ok(Err(err)) => {
                    warn!(attempt, error = %err, "nightly sweep failed");
                }
                Err(_) => {
                    warn!(attempt, timeout_secs = job_timeout.as_secs(), "nightly sweep timed out");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(retry_delay * attempt).await;
            }
        }
        error!(max_attempts, "nightly sweep gave up until next trigger");
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        if self.scheduler.is_some() {
            warn!("sweep scheduler dropped while running");
        }
    }
}
