//! Push notification dispatch
//!
//! Provides VAPID-signed Web Push delivery with explicit outcome
//! classification: the dispatcher makes exactly one delivery attempt per
//! call and reports whether the subscription is still usable.

pub mod dispatcher;
pub mod transport;
pub mod types;
pub mod vapid;

pub use dispatcher::{DispatchError, NotificationDispatcher};
pub use transport::{PushTransport, WebPushTransport};
pub use types::{DeliveryOutcome, NotificationPayload, PushSubscription, PushSubscriptionKeys};
pub use vapid::{ConfigError, VapidIdentity};
