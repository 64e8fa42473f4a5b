//! Availability scheduling: interval model, slot generation, and the
//! day/slot-level planner.

pub mod planner;
pub mod ports;
pub mod slots;
pub mod visibility;

pub use planner::AvailabilityService;
pub use slots::generate_slots;
pub use visibility::occupies_slot;
