//! Types for push notifications

use serde::{Deserialize, Serialize};

/// Keys for a push subscription (from browser)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    /// The p256dh key for encryption
    pub p256dh: String,
    /// The auth secret
    pub auth: String,
}

/// A browser push subscription descriptor: endpoint plus encryption keys.
///
/// Issued by a push service to one client installation. The dispatcher
/// borrows it for a single delivery attempt; the user store owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    /// The push endpoint URL
    pub endpoint: String,
    /// Encryption keys
    pub keys: PushSubscriptionKeys,
}

impl PushSubscription {
    /// Create a new subscription descriptor
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys: PushSubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }

    /// Just the domain of the endpoint, safe for logs and listings
    pub fn endpoint_domain(&self) -> String {
        self.endpoint
            .strip_prefix("https://")
            .or_else(|| self.endpoint.strip_prefix("http://"))
            .and_then(|s| s.split('/').next())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Payload for a push notification
///
/// Either a plain display string sent verbatim, or a title/body alert
/// serialized as JSON. Serialization is deterministic: the same payload
/// always produces the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationPayload {
    /// Plain display text, used verbatim as the message bytes
    Text(String),
    /// Structured notification with a title and body
    Alert { title: String, body: String },
}

impl NotificationPayload {
    /// Create a plain text payload
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a title/body alert payload
    pub fn alert(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Alert {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Serialize the payload to the bytes handed to the transport.
    ///
    /// Alerts serialize with fixed field order (title, body) so repeated
    /// calls produce byte-identical output.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.as_bytes().to_vec(),
            Self::Alert { title, body } => {
                #[derive(Serialize)]
                struct Alert<'a> {
                    title: &'a str,
                    body: &'a str,
                }
                serde_json::to_vec(&Alert { title, body })
                    .expect("alert payload serialization cannot fail")
            }
        }
    }
}

/// Outcome of a single delivery attempt
///
/// This is the only shape the rest of the system branches on. Failures are
/// values, not errors: a dead endpoint or a flaky push service must never
/// unwind through the calling handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The push service accepted the message
    Delivered,
    /// The subscription is permanently invalid and must not be retried
    Expired,
    /// Network or server error; the subscription may still be valid
    TransientFailure(String),
    /// The payload was rejected (malformed or too large)
    RejectedPayload(String),
}

impl DeliveryOutcome {
    /// Whether the caller should invalidate the stored subscription
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}
