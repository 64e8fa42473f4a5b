//! Dispatch worker with explicit lifecycle management.
//!
//! Drains the dispatch channel and hands each event id to the executor.
//! Join handles are tracked, cancellation is explicit, and each execution is
//! wrapped in a timeout.

use std::sync::Arc;
use std::time::Duration;

use slotline_core::EventExecutor;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::dispatch::error::{SchedulerError, SchedulerResult};

/// Configuration for the dispatch worker.
#[derive(Debug, Clone)]
pub struct DispatchWorkerConfig {
    /// Timeout for executing a single event (covers the full retry cycle)
    pub processing_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for DispatchWorkerConfig {
    fn default() -> Self {
        Self {
            processing_timeout: Duration::from_secs(300),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Channel-fed delivery loop.
pub struct DispatchWorker {
    executor: Arc<dyn EventExecutor>,
    receiver: Option<mpsc::UnboundedReceiver<String>>,
    config: DispatchWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl DispatchWorker {
    /// Create a new worker draining `receiver` into `executor`.
    pub fn new(
        executor: Arc<dyn EventExecutor>,
        receiver: mpsc::UnboundedReceiver<String>,
        config: DispatchWorkerConfig,
    ) -> Self {
        Self {
            executor,
            receiver: Some(receiver),
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background processing task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let receiver = self.receiver.take().ok_or_else(|| {
            SchedulerError::StartFailed("dispatch channel already consumed".into())
        })?;

        info!("starting dispatch worker");
        self.cancellation = CancellationToken::new();

        let executor = Arc::clone(&self.executor);
        let processing_timeout = self.config.processing_timeout;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(executor, receiver, processing_timeout, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("dispatch worker started");
        Ok(())
    }

    /// Stop the worker and wait for the processing task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("stopping dispatch worker");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "dispatch worker task panicked");
                    return Err(SchedulerError::TaskJoinFailed(err.to_string()));
                }
                Err(_) => {
                    warn!("dispatch worker did not stop within timeout");
                    return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
                }
            }
        }

        info!("dispatch worker stopped");
        Ok(())
    }

    /// Returns true when the worker task is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn process_loop(
        executor: Arc<dyn EventExecutor>,
        mut receiver: mpsc::UnboundedReceiver<String>,
        processing_timeout: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("dispatch worker loop cancelled");
                    break;
                }
                maybe_id = receiver.recv() => {
                    let Some(event_id) = maybe_id else {
                        debug!("dispatch channel closed, worker exiting");
                        break;
                    };
                    match tokio::time::timeout(processing_timeout, executor.execute(&event_id))
                        .await
                    {
                        Ok(()) => {}
                        Err(_) => warn!(
                            event_id = %event_id,
                            timeout_secs = processing_timeout.as_secs(),
                            "event execution timed out"
                        ),
                    }
                }
            }
        }
    }
}

impl Drop for DispatchWorker {
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            warn!("dispatch worker dropped while running, cancelling task");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Mutex as TokioMutex;

    use super::*;

    #[derive(Default)]
    struct RecordingExecutor {
        executed: Arc<TokioMutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventExecutor for RecordingExecutor {
        async fn execute(&self, event_id: &str) {
            self.executed.lock().await.push(event_id.to_string());
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn worker_drains_channel_into_executor() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let executor = Arc::new(RecordingExecutor::default());
        let mut worker = DispatchWorker::new(
            executor.clone(),
            receiver,
            DispatchWorkerConfig::default(),
        );

        worker.start().unwrap();
        sender.send("evt-1".to_string()).unwrap();
        sender.send("evt-2".to_string()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if executor.executed.lock().await.len() == 2 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        worker.stop().await.unwrap();
        assert_eq!(
            executor.executed.lock().await.as_slice(),
            &["evt-1".to_string(), "evt-2".to_string()]
        );
    }

    #[tokio::test]
    async fn double_start_is_rejected() {
        let (_sender, receiver) = mpsc::unbounded_channel();
        let mut worker = DispatchWorker::new(
            Arc::new(RecordingExecutor::default()),
            receiver,
            DispatchWorkerConfig::default(),
        );

        worker.start().unwrap();
        assert!(matches!(worker.start(), Err(SchedulerError::AlreadyRunning)));
        worker.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_rejected() {
        let (_sender, receiver) = mpsc::unbounded_channel();
        let mut worker = DispatchWorker::new(
            Arc::new(RecordingExecutor::default()),
            receiver,
            DispatchWorkerConfig::default(),
        );

        assert!(matches!(worker.stop().await, Err(SchedulerError::NotRunning)));
    }
}
