//! # Slotline Infrastructure
//!
//! Infrastructure adapters for Slotline.
//!
//! This crate contains:
//! - SQLite persistence (bookings, working calendar, outbox events)
//! - Dispatch runtime (delivery timers, worker loop, nightly sweep cron)
//! - Configuration loading
//! - Error conversions from external libraries into domain errors
//!
//! ## Architecture
//! - Implements the port traits defined in `slotline-core`
//! - Depends on `slotline-domain` and `slotline-core`
//! - All platform and I/O concerns live here

pub mod config;
pub mod database;
pub mod dispatch;
pub mod errors;

pub use database::{
    DbManager, SqliteBookingRepository, SqliteOutboxStore, SqliteWorkCalendarRepository,
};
pub use dispatch::{
    DispatchWorker, DispatchWorkerConfig, SweepScheduler, SweepSchedulerConfig,
    TokioDeliveryScheduler,
};
pub use errors::InfraError;
