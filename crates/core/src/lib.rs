//! # Slotline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The availability scheduler (interval model, slot generator, planner)
//! - The outbox dispatcher and booking lifecycle hooks
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `slotline-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod booking;
pub mod outbox;
pub mod scheduling;
pub mod time;

// Re-export specific items to avoid ambiguity
pub use booking::BookingLifecycle;
pub use outbox::dispatcher::OutboxDispatcher;
pub use outbox::ports::{
    DeliveryHandle, DeliveryScheduler, EventExecutor, NotificationTransport, OutboxStore,
};
pub use scheduling::planner::AvailabilityService;
pub use scheduling::ports::{BookingRepository, WorkCalendarRepository};
pub use time::parse_timezone;
