//! Notification dispatch
//!
//! Orchestrates a single delivery attempt: validate the subscription
//! descriptor, serialize the payload, invoke the transport exactly once,
//! classify, return. Retry policy and subscription invalidation both
//! belong to the caller.

use super::transport::PushTransport;
use super::types::{DeliveryOutcome, NotificationPayload, PushSubscription};
use super::vapid::VapidIdentity;
use thiserror::Error;

/// Caller programming errors, distinct from operational delivery outcomes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The descriptor is structurally invalid; no network call was made
    #[error("invalid push subscription: {0}")]
    InvalidSubscription(&'static str),
}

/// Orchestrates delivery attempts and returns caller-facing outcomes.
///
/// Holds the process-wide VAPID identity and a transport; no other state.
/// `deliver` calls are independent, hold no locks, and may run
/// concurrently against the same or different subscriptions.
pub struct NotificationDispatcher {
    identity: VapidIdentity,
    transport: Box<dyn PushTransport>,
}

impl NotificationDispatcher {
    /// Create a dispatcher signing with `identity` and sending over
    /// `transport`
    pub fn new(identity: VapidIdentity, transport: impl PushTransport + 'static) -> Self {
        Self {
            identity,
            transport: Box::new(transport),
        }
    }

    /// The identity used to sign outbound pushes
    pub fn identity(&self) -> &VapidIdentity {
        &self.identity
    }

    /// Deliver one notification to one subscription.
    ///
    /// Performs exactly one transport call per invocation. On `Expired`
    /// the stored subscription is NOT cleared here; the caller owns the
    /// registry and decides.
    pub async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<DeliveryOutcome, DispatchError> {
        validate_subscription(subscription)?;

        let bytes = payload.to_bytes();
        let outcome = self
            .transport
            .send(&self.identity, subscription, &bytes)
            .await;

        let domain = subscription.endpoint_domain();
        match &outcome {
            DeliveryOutcome::Delivered => {
                log::debug!("Delivered push notification via {}", domain)
            }
            DeliveryOutcome::Expired => {
                log::info!("Push subscription at {} is expired", domain)
            }
            DeliveryOutcome::TransientFailure(reason) => {
                log::warn!("Push delivery via {} failed: {}", domain, reason)
            }
            DeliveryOutcome::RejectedPayload(reason) => {
                log::warn!("Push payload rejected by {}: {}", domain, reason)
            }
        }

        Ok(outcome)
    }
}

/// Fail fast on malformed descriptors, before any network call
fn validate_subscription(subscription: &PushSubscription) -> Result<(), DispatchError> {
    if subscription.endpoint.trim().is_empty() {
        return Err(DispatchError::InvalidSubscription("endpoint is empty"));
    }
    if subscription.keys.p256dh.trim().is_empty() {
        return Err(DispatchError::InvalidSubscription("p256dh key is empty"));
    }
    if subscription.keys.auth.trim().is_empty() {
        return Err(DispatchError::InvalidSubscription("auth secret is empty"));
    }
    Ok(())
}
