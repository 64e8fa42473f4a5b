//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Working-day defaults
pub const DEFAULT_WORK_START_HOUR: u32 = 10;
pub const DEFAULT_WORK_END_HOUR: u32 = 20;
pub const DEFAULT_GRID_STEP_MIN: i64 = 10;
pub const DEFAULT_DAYS_AHEAD: u32 = 60;
pub const DEFAULT_TIMEZONE: &str = "UTC";

// Pending bookings hold their slot for this long before becoming invisible
pub const DEFAULT_LOCK_TIMEOUT_MIN: i64 = 15;

// Client reminder fires this long before the appointment starts
pub const REMINDER_OFFSET_MIN: i64 = 60;

// Outbox dispatch configuration
pub const DEFAULT_MAX_DELIVERY_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;
pub const DEFAULT_DELIVER_TIMEOUT_SECS: u64 = 30;

// Nightly sweep: every day at midnight (scheduler clock)
pub const DEFAULT_SWEEP_CRON: &str = "0 0 0 * * *";
pub const DEFAULT_SWEEP_GRACE_SECS: i64 = 300;
