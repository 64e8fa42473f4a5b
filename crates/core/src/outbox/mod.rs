//! Transactional outbox: ports, retry policy, and the dispatcher service.

pub mod dispatcher;
pub mod ports;
pub mod retry;

pub use dispatcher::OutboxDispatcher;
pub use ports::{DeliveryHandle, DeliveryScheduler, EventExecutor, NotificationTransport, OutboxStore};
