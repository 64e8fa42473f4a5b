//! Booking lifecycle hooks that feed the notification outbox.

pub mod lifecycle;

pub use lifecycle::BookingLifecycle;
