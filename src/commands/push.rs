//! Push notification commands
//!
//! The dispatch call sites. These own the registry decision the
//! dispatcher deliberately does not make: a delivery that comes back
//! `Expired` clears the stored subscription here, and nowhere else.

use super::CommandError;
use crate::file_storage::users;
use crate::push::{
    DeliveryOutcome, DispatchError, NotificationDispatcher, NotificationPayload, PushSubscription,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Response for VAPID public key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}

/// Get the VAPID public key clients need to subscribe
pub fn vapid_public_key(dispatcher: &NotificationDispatcher) -> VapidPublicKeyResponse {
    VapidPublicKeyResponse {
        public_key: dispatcher.identity().public_key().to_string(),
    }
}

/// Input for registering/updating a user's push subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeInput {
    pub user_id: String,
    pub subscription: PushSubscription,
}

/// Response for a subscription update, including the outcome of the
/// greeting ping sent to the fresh subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub user_id: String,
    pub greeting: DeliveryReport,
}

/// Wire-friendly summary of a delivery outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// One of: delivered, expired, transient_failure, rejected_payload
    pub status: String,
    /// Diagnostic reason for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&DeliveryOutcome> for DeliveryReport {
    fn from(outcome: &DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Delivered => Self {
                status: "delivered".to_string(),
                reason: None,
            },
            DeliveryOutcome::Expired => Self {
                status: "expired".to_string(),
                reason: None,
            },
            DeliveryOutcome::TransientFailure(reason) => Self {
                status: "transient_failure".to_string(),
                reason: Some(reason.clone()),
            },
            DeliveryOutcome::RejectedPayload(reason) => Self {
                status: "rejected_payload".to_string(),
                reason: Some(reason.clone()),
            },
        }
    }
}

/// Store a user's push subscription and send the greeting ping.
///
/// The subscription stays registered even if the ping fails transiently;
/// only an `Expired` outcome clears it again.
pub async fn subscribe(
    data_dir: &Path,
    dispatcher: &NotificationDispatcher,
    input: SubscribeInput,
) -> Result<SubscribeResponse, CommandError> {
    let user = users::find_user(data_dir, &input.user_id)?
        .ok_or_else(|| CommandError::NotFound("User not found".to_string()))?;

    if !users::set_subscription(data_dir, &user.id, input.subscription.clone())? {
        return Err(CommandError::NotFound("User not found".to_string()));
    }

    // Greeting ping so the browser shows something right away
    let payload =
        NotificationPayload::text(format!("Hi {}, you have a new notification!", user.email));
    let outcome = deliver_for_user(data_dir, dispatcher, &user.id, &input.subscription, &payload)
        .await?;

    Ok(SubscribeResponse {
        user_id: user.id,
        greeting: DeliveryReport::from(&outcome),
    })
}

/// Remove a user's push subscription.
///
/// Returns true if a subscription was removed.
pub fn unsubscribe(data_dir: &Path, user_id: &str) -> Result<bool, CommandError> {
    if users::find_user(data_dir, user_id)?.is_none() {
        return Err(CommandError::NotFound("User not found".to_string()));
    }
    Ok(users::clear_subscription(data_dir, user_id)?)
}

/// Input for notifying a user by email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyUserInput {
    pub email: String,
    pub title: String,
    pub body: String,
}

/// Send a title/body notification to the user registered under `email`
pub async fn notify_user(
    data_dir: &Path,
    dispatcher: &NotificationDispatcher,
    input: NotifyUserInput,
) -> Result<DeliveryOutcome, CommandError> {
    let user = users::find_user_by_email(data_dir, input.email.trim())?
        .ok_or_else(|| CommandError::NotFound("User not found".to_string()))?;
    let subscription = user.subscription.ok_or_else(|| {
        CommandError::NotFound("User has no push subscription".to_string())
    })?;

    let payload = NotificationPayload::alert(input.title, input.body);
    deliver_for_user(data_dir, dispatcher, &user.id, &subscription, &payload).await
}

/// Input for sending to a caller-supplied subscription descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyDirectInput {
    pub subscription: PushSubscription,
    pub message: String,
}

/// Send a plain text message to a descriptor without touching the
/// registry
pub async fn notify_subscription(
    dispatcher: &NotificationDispatcher,
    input: NotifyDirectInput,
) -> Result<DeliveryOutcome, CommandError> {
    dispatcher
        .deliver(&input.subscription, &NotificationPayload::text(input.message))
        .await
        .map_err(dispatch_error)
}

/// Deliver to a stored subscription and apply the caller-side registry
/// rule: `Expired` invalidates it.
async fn deliver_for_user(
    data_dir: &Path,
    dispatcher: &NotificationDispatcher,
    user_id: &str,
    subscription: &PushSubscription,
    payload: &NotificationPayload,
) -> Result<DeliveryOutcome, CommandError> {
    let outcome = dispatcher
        .deliver(subscription, payload)
        .await
        .map_err(dispatch_error)?;

    if outcome.is_expired() {
        users::clear_subscription(data_dir, user_id)?;
    }

    Ok(outcome)
}

// A malformed descriptor is the caller's mistake, not a server fault
fn dispatch_error(error: DispatchError) -> CommandError {
    CommandError::Invalid(error.to_string())
}
