//! Push delivery transport
//!
//! Thin capability over the web-push crate: one signed, encrypted delivery
//! attempt per call. Retries are the caller's decision; ordinary failures
//! come back as [`DeliveryOutcome`] values, never as panics.

use super::types::{DeliveryOutcome, PushSubscription};
use super::vapid::VapidIdentity;
use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

/// A single delivery attempt against a push service.
///
/// Implementations perform exactly one network round trip per call and hold
/// no session state across calls, so concurrent sends never contend.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Sign the request with `identity`, deliver `payload` to the
    /// subscription's endpoint, and classify the result.
    async fn send(
        &self,
        identity: &VapidIdentity,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryOutcome;
}

/// Transport backed by the web-push crate's isahc client
pub struct WebPushTransport {
    client: IsahcWebPushClient,
}

impl WebPushTransport {
    /// Create a new transport.
    ///
    /// Fails only when the underlying HTTP client cannot be constructed,
    /// which is a startup problem, not a delivery outcome.
    pub fn new() -> Result<Self, String> {
        let client = IsahcWebPushClient::new()
            .map_err(|e| format!("Failed to create web push client: {:?}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        identity: &VapidIdentity,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryOutcome {
        let subscription_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        // VAPID signature from the base64url-encoded private key
        let mut sig_builder = match VapidSignatureBuilder::from_base64(
            identity.private_key(),
            URL_SAFE_NO_PAD,
            &subscription_info,
        ) {
            Ok(builder) => builder,
            Err(e) => return classify_error(&e),
        };
        sig_builder.add_claim("sub", identity.contact_uri().to_string());

        let signature = match sig_builder.build() {
            Ok(signature) => signature,
            Err(e) => return classify_error(&e),
        };

        let mut builder = WebPushMessageBuilder::new(&subscription_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);

        let message = match builder.build() {
            Ok(message) => message,
            Err(e) => return classify_error(&e),
        };

        match self.client.send(message).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(e) => classify_error(&e),
        }
    }
}

/// Map a web-push error onto the delivery-outcome taxonomy.
///
/// A single classification step on the structured error: the 404/410
/// family means the subscription is gone, payload and key problems are the
/// caller's to fix, everything else may succeed on a later attempt.
fn classify_error(error: &WebPushError) -> DeliveryOutcome {
    match error {
        WebPushError::EndpointNotFound | WebPushError::EndpointNotValid => {
            DeliveryOutcome::Expired
        }
        WebPushError::PayloadTooLarge => DeliveryOutcome::RejectedPayload(
            "payload exceeds the push service size limit".to_string(),
        ),
        WebPushError::BadRequest(detail) => DeliveryOutcome::RejectedPayload(match detail {
            Some(detail) => format!("request rejected by push service: {}", detail),
            None => "request rejected by push service".to_string(),
        }),
        WebPushError::MissingCryptoKeys | WebPushError::InvalidCryptoKeys => {
            DeliveryOutcome::RejectedPayload("subscription encryption keys were rejected".to_string())
        }
        WebPushError::ServerError(retry_after) => DeliveryOutcome::TransientFailure(format!(
            "push service error, retry after: {:?}",
            retry_after
        )),
        other => DeliveryOutcome::TransientFailure(format!("push delivery failed: {:?}", other)),
    }
}
