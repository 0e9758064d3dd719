//! HTTP route handlers
//!
//! Thin translation layer: deserialize the request, call the command,
//! map the result onto an HTTP status and JSON body. A failed push is a
//! structured response here, never a crashed handler.

use super::ServerAppState;
use crate::commands::{accounts, push, CommandError};
use crate::push::DeliveryOutcome;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

type ApiResponse = (StatusCode, Json<Value>);

/// Map a command error onto a status code and error body
fn error_response(error: CommandError) -> ApiResponse {
    let status = match &error {
        CommandError::Invalid(_) => StatusCode::BAD_REQUEST,
        CommandError::NotFound(_) => StatusCode::NOT_FOUND,
        CommandError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() })))
}

/// Map a delivery outcome onto a status code and report body.
///
/// Expired means the stored subscription was already invalidated by the
/// command layer; 410 tells the client to re-subscribe.
fn outcome_response(outcome: &DeliveryOutcome) -> ApiResponse {
    let status = match outcome {
        DeliveryOutcome::Delivered => StatusCode::OK,
        DeliveryOutcome::Expired => StatusCode::GONE,
        DeliveryOutcome::TransientFailure(_) => StatusCode::BAD_GATEWAY,
        DeliveryOutcome::RejectedPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let body = match outcome {
        DeliveryOutcome::Delivered => json!({
            "success": true,
            "message": "Notification sent",
            "delivery": push::DeliveryReport::from(outcome),
        }),
        DeliveryOutcome::Expired => json!({
            "error": "Subscription is no longer valid",
            "delivery": push::DeliveryReport::from(outcome),
        }),
        _ => json!({
            "error": "Notification could not be delivered",
            "delivery": push::DeliveryReport::from(outcome),
        }),
    };
    (status, Json(body))
}

/// POST /api/auth/register
pub async fn register_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<accounts::RegisterInput>,
) -> ApiResponse {
    match accounts::register(&state.data_dir, input) {
        Ok(user) => (
            StatusCode::CREATED,
            Json(json!({ "message": "User registered", "user": user })),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/login
pub async fn login_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<accounts::LoginInput>,
) -> ApiResponse {
    match accounts::login(&state.data_dir, input) {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({ "message": "Login successful", "user": user })),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /api/auth/users
pub async fn users_handler(State(state): State<ServerAppState>) -> ApiResponse {
    match accounts::list_users(&state.data_dir) {
        Ok(users) => (StatusCode::OK, Json(json!({ "users": users }))),
        Err(e) => error_response(e),
    }
}

/// GET /api/push/vapid-public-key
pub async fn vapid_public_key_handler(State(state): State<ServerAppState>) -> ApiResponse {
    let response = push::vapid_public_key(&state.dispatcher);
    (StatusCode::OK, Json(json!(response)))
}

/// POST /api/push/subscribe
pub async fn subscribe_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<push::SubscribeInput>,
) -> ApiResponse {
    match push::subscribe(&state.data_dir, &state.dispatcher, input).await {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({ "message": "Subscription updated", "result": response })),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /api/push/unsubscribe
pub async fn unsubscribe_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<Value>,
) -> ApiResponse {
    let user_id = match input.get("userId").and_then(Value::as_str) {
        Some(user_id) => user_id.to_string(),
        None => {
            return error_response(CommandError::Invalid(
                "Missing argument: userId".to_string(),
            ))
        }
    };

    match push::unsubscribe(&state.data_dir, &user_id) {
        Ok(removed) => (StatusCode::OK, Json(json!({ "removed": removed }))),
        Err(e) => error_response(e),
    }
}

/// POST /api/push/notify
pub async fn notify_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<push::NotifyUserInput>,
) -> ApiResponse {
    match push::notify_user(&state.data_dir, &state.dispatcher, input).await {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => error_response(e),
    }
}

/// POST /api/push/send
pub async fn notify_direct_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<push::NotifyDirectInput>,
) -> ApiResponse {
    match push::notify_subscription(&state.dispatcher, input).await {
        Ok(outcome) => outcome_response(&outcome),
        Err(e) => error_response(e),
    }
}
