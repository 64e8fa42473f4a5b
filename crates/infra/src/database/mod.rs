//! SQLite persistence layer.

mod booking_repository;
mod calendar_repository;
mod manager;
mod outbox_store;
mod rows;

pub use booking_repository::SqliteBookingRepository;
pub use calendar_repository::SqliteWorkCalendarRepository;
pub use manager::DbManager;
pub use outbox_store::SqliteOutboxStore;
