//! Pushbox: account and Web Push notification backend
//!
//! Registers users, stores one browser push subscription per user, and
//! delivers VAPID-signed Web Push messages. Delivery failures are
//! classified into an explicit outcome taxonomy so callers can decide
//! what to retry and what to invalidate.

// Module declarations
pub mod commands;
pub mod file_storage;
pub mod push;
pub mod server;
pub mod shutdown;

// Re-export the dispatch types most callers need
pub use push::{
    DeliveryOutcome, DispatchError, NotificationDispatcher, NotificationPayload, PushSubscription,
    PushTransport, VapidIdentity,
};
