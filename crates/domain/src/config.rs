//! Application configuration structures
//!
//! Scheduling behaviour (work hours, grid step, lock timeout) is deliberately
//! modelled as explicit values handed to the scheduling functions at call
//! time rather than ambient global state, so availability computation stays
//! deterministic and testable under varied configurations.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DAYS_AHEAD, DEFAULT_DELIVER_TIMEOUT_SECS, DEFAULT_GRID_STEP_MIN,
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_LOCK_TIMEOUT_MIN, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_MAX_DELIVERY_RETRIES, DEFAULT_SWEEP_CRON, DEFAULT_SWEEP_GRACE_SECS, DEFAULT_TIMEZONE,
    DEFAULT_WORK_END_HOUR, DEFAULT_WORK_START_HOUR,
};
use crate::errors::{Result, SlotlineError};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Connection pool size
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "slotline.db".into(), pool_size: default_pool_size() }
    }
}

/// Availability scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// First bookable hour of the working day (local time)
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,
    /// End of the working day (local time); the last slot may end exactly
    /// here
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,
    /// Granularity of candidate slot start times, in minutes
    #[serde(default = "default_grid_step_min")]
    pub grid_step_min: i64,
    /// How long a pending booking keeps occupying its slot, in minutes
    #[serde(default = "default_lock_timeout_min")]
    pub lock_timeout_min: i64,
    /// Default horizon for day-level availability queries
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    /// IANA timezone name of the business calendar
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            grid_step_min: default_grid_step_min(),
            lock_timeout_min: default_lock_timeout_min(),
            days_ahead: default_days_ahead(),
            timezone: default_timezone(),
        }
    }
}

impl SchedulingConfig {
    /// Reject configurations that cannot produce a meaningful slot grid.
    pub fn validate(&self) -> Result<()> {
        if self.grid_step_min <= 0 {
            return Err(SlotlineError::Config(format!(
                "grid step must be positive, got {}",
                self.grid_step_min
            )));
        }
        if self.lock_timeout_min < 0 {
            return Err(SlotlineError::Config(format!(
                "lock timeout must not be negative, got {}",
                self.lock_timeout_min
            )));
        }
        if self.work_start_hour >= self.work_end_hour || self.work_end_hour > 24 {
            return Err(SlotlineError::Config(format!(
                "invalid work window {}..{}",
                self.work_start_hour, self.work_end_hour
            )));
        }
        Ok(())
    }
}

/// Outbox dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum retry attempts for a transient delivery failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First retry delay; doubles on each subsequent attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on the retry delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Timeout applied to a single transport call
    #[serde(default = "default_deliver_timeout_secs")]
    pub deliver_timeout_secs: u64,
    /// Cron expression for the nightly reconciliation sweep
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
    /// Events overdue by more than this are sent immediately by the sweep;
    /// tolerates clock drift and restarts
    #[serde(default = "default_sweep_grace_secs")]
    pub sweep_grace_secs: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            deliver_timeout_secs: default_deliver_timeout_secs(),
            sweep_cron: default_sweep_cron(),
            sweep_grace_secs: default_sweep_grace_secs(),
        }
    }
}

fn default_pool_size() -> u32 {
    4
}

fn default_work_start_hour() -> u32 {
    DEFAULT_WORK_START_HOUR
}

fn default_work_end_hour() -> u32 {
    DEFAULT_WORK_END_HOUR
}

fn default_grid_step_min() -> i64 {
    DEFAULT_GRID_STEP_MIN
}

fn default_lock_timeout_min() -> i64 {
    DEFAULT_LOCK_TIMEOUT_MIN
}

fn default_days_ahead() -> u32 {
    DEFAULT_DAYS_AHEAD
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_DELIVERY_RETRIES
}

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

fn default_deliver_timeout_secs() -> u64 {
    DEFAULT_DELIVER_TIMEOUT_SECS
}

fn default_sweep_cron() -> String {
    DEFAULT_SWEEP_CRON.to_string()
}

fn default_sweep_grace_secs() -> i64 {
    DEFAULT_SWEEP_GRACE_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SchedulingConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_grid_step_is_rejected() {
        let cfg = SchedulingConfig { grid_step_min: 0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(SlotlineError::Config(_))));
    }

    #[test]
    fn inverted_work_window_is_rejected() {
        let cfg =
            SchedulingConfig { work_start_hour: 20, work_end_hour: 10, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
