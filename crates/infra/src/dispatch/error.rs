//! Dispatch runtime error types

use slotline_domain::SlotlineError;
use thiserror::Error;

use crate::errors::InfraError;

/// Errors raised by the dispatch background components
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Component is already running
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// Component is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// Failed to create scheduler
    #[error("Failed to create scheduler: {0}")]
    CreationFailed(String),

    /// Failed to start scheduler
    #[error("Failed to start scheduler: {0}")]
    StartFailed(String),

    /// Failed to stop scheduler
    #[error("Failed to stop scheduler: {0}")]
    StopFailed(String),

    /// Failed to register job
    #[error("Failed to register job: {0}")]
    JobRegistrationFailed(String),

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

/// Result alias for dispatch runtime operations
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let mapped = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                SlotlineError::InvalidInput(err.to_string())
            }
            _ => SlotlineError::Internal(err.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<SchedulerError> for SlotlineError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}
