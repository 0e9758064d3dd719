// Integration tests for the push dispatch subsystem and the command layer
// that consumes it. A fake transport stands in for the push service so
// outcomes are deterministic and invocation counts observable.

use async_trait::async_trait;
use pushbox_lib::commands::{accounts, push as push_commands, CommandError};
use pushbox_lib::file_storage::users;
use pushbox_lib::push::{
    DeliveryOutcome, DispatchError, NotificationDispatcher, NotificationPayload, PushSubscription,
    PushTransport, VapidIdentity,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Transport double: counts calls, records payload bytes, replays a fixed
/// outcome
#[derive(Clone)]
struct FakeTransport {
    calls: Arc<AtomicUsize>,
    payloads: Arc<Mutex<Vec<Vec<u8>>>>,
    outcome: DeliveryOutcome,
}

impl FakeTransport {
    fn new(outcome: DeliveryOutcome) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            payloads: Arc::new(Mutex::new(Vec::new())),
            outcome,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn recorded_payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for FakeTransport {
    async fn send(
        &self,
        _identity: &VapidIdentity,
        _subscription: &PushSubscription,
        payload: &[u8],
    ) -> DeliveryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.to_vec());
        self.outcome.clone()
    }
}

fn test_identity() -> VapidIdentity {
    VapidIdentity::from_parts("mailto:ops@example.com", "test-public-key", "test-private-key")
        .unwrap()
}

fn test_subscription() -> PushSubscription {
    PushSubscription::new("https://push.example/ep1", "k1", "a1")
}

/// Register a user and store a subscription for them, returning the user id
fn seed_subscribed_user(data_dir: &std::path::Path, email: &str) -> String {
    let user = accounts::register(
        data_dir,
        accounts::RegisterInput {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
        },
    )
    .unwrap();
    users::set_subscription(data_dir, &user.id, test_subscription()).unwrap();
    user.id
}

#[tokio::test]
async fn test_alert_delivery_succeeds() {
    let transport = FakeTransport::new(DeliveryOutcome::Delivered);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let outcome = dispatcher
        .deliver(
            &test_subscription(),
            &NotificationPayload::alert("Hi", "New message"),
        )
        .await
        .unwrap();

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    assert_eq!(transport.call_count(), 1);

    // The transport saw the canonical key-ordered encoding
    let payloads = transport.recorded_payloads();
    assert_eq!(payloads[0], br#"{"title":"Hi","body":"New message"}"#.to_vec());
}

#[tokio::test]
async fn test_repeated_delivery_serializes_identically() {
    let transport = FakeTransport::new(DeliveryOutcome::Delivered);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());
    let payload = NotificationPayload::alert("T", "B");

    dispatcher
        .deliver(&test_subscription(), &payload)
        .await
        .unwrap();
    dispatcher
        .deliver(&test_subscription(), &payload)
        .await
        .unwrap();

    let payloads = transport.recorded_payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[0], payloads[1]);
}

#[tokio::test]
async fn test_invalid_subscription_fails_before_transport() {
    let transport = FakeTransport::new(DeliveryOutcome::Delivered);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let result = dispatcher
        .deliver(
            &PushSubscription::new("", "k1", "a1"),
            &NotificationPayload::text("ping"),
        )
        .await;

    assert!(matches!(result, Err(DispatchError::InvalidSubscription(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_expired_delivery_invalidates_stored_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = seed_subscribed_user(dir.path(), "ada@example.com");

    // Push service answers 410 Gone for this endpoint
    let transport = FakeTransport::new(DeliveryOutcome::Expired);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let outcome = push_commands::notify_user(
        dir.path(),
        &dispatcher,
        push_commands::NotifyUserInput {
            email: "ada@example.com".to_string(),
            title: "Hi".to_string(),
            body: "New message".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome, DeliveryOutcome::Expired);
    assert_eq!(transport.call_count(), 1);

    // The command layer cleared the registry entry
    assert!(users::get_subscription(dir.path(), &user_id)
        .unwrap()
        .is_none());

    // A later notify finds no subscription and never reaches the transport
    let result = push_commands::notify_user(
        dir.path(),
        &dispatcher,
        push_commands::NotifyUserInput {
            email: "ada@example.com".to_string(),
            title: "Hi".to_string(),
            body: "Again".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(CommandError::NotFound(_))));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_transient_failure_keeps_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = seed_subscribed_user(dir.path(), "ada@example.com");

    let transport =
        FakeTransport::new(DeliveryOutcome::TransientFailure("connection refused".into()));
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let outcome = push_commands::notify_user(
        dir.path(),
        &dispatcher,
        push_commands::NotifyUserInput {
            email: "ada@example.com".to_string(),
            title: "Hi".to_string(),
            body: "New message".to_string(),
        },
    )
    .await
    .unwrap();

    match outcome {
        DeliveryOutcome::TransientFailure(reason) => assert!(!reason.is_empty()),
        other => panic!("expected TransientFailure, got {:?}", other),
    }

    // Still registered: the subscription may well be fine
    assert!(users::get_subscription(dir.path(), &user_id)
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_subscribe_sends_greeting_ping() {
    let dir = tempfile::tempdir().unwrap();
    let user = accounts::register(
        dir.path(),
        accounts::RegisterInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        },
    )
    .unwrap();

    let transport = FakeTransport::new(DeliveryOutcome::Delivered);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let response = push_commands::subscribe(
        dir.path(),
        &dispatcher,
        push_commands::SubscribeInput {
            user_id: user.id.clone(),
            subscription: test_subscription(),
        },
    )
    .await
    .unwrap();

    assert_eq!(response.greeting.status, "delivered");
    assert_eq!(transport.call_count(), 1);

    // Greeting is the plain text ping, sent verbatim
    let payloads = transport.recorded_payloads();
    assert_eq!(
        payloads[0],
        b"Hi ada@example.com, you have a new notification!".to_vec()
    );

    assert!(users::get_subscription(dir.path(), &user.id)
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_subscribe_with_dead_endpoint_clears_it_again() {
    let dir = tempfile::tempdir().unwrap();
    let user = accounts::register(
        dir.path(),
        accounts::RegisterInput {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "hunter2".to_string(),
        },
    )
    .unwrap();

    let transport = FakeTransport::new(DeliveryOutcome::Expired);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let response = push_commands::subscribe(
        dir.path(),
        &dispatcher,
        push_commands::SubscribeInput {
            user_id: user.id.clone(),
            subscription: test_subscription(),
        },
    )
    .await
    .unwrap();

    assert_eq!(response.greeting.status, "expired");
    assert!(users::get_subscription(dir.path(), &user.id)
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_direct_send_bypasses_registry() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = seed_subscribed_user(dir.path(), "ada@example.com");

    // Even an Expired outcome must not touch stored subscriptions: the
    // descriptor was supplied by the caller, not looked up
    let transport = FakeTransport::new(DeliveryOutcome::Expired);
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let outcome = push_commands::notify_subscription(
        &dispatcher,
        push_commands::NotifyDirectInput {
            subscription: PushSubscription::new("https://push.example/other", "k2", "a2"),
            message: "direct message".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome, DeliveryOutcome::Expired);
    assert!(users::get_subscription(dir.path(), &user_id)
        .unwrap()
        .is_some());

    let payloads = transport.recorded_payloads();
    assert_eq!(payloads[0], b"direct message".to_vec());
}

#[tokio::test]
async fn test_rejected_payload_surfaces_reason() {
    let transport =
        FakeTransport::new(DeliveryOutcome::RejectedPayload("payload too large".into()));
    let dispatcher = NotificationDispatcher::new(test_identity(), transport.clone());

    let outcome = dispatcher
        .deliver(
            &test_subscription(),
            &NotificationPayload::text("x".repeat(5000)),
        )
        .await
        .unwrap();

    match outcome {
        DeliveryOutcome::RejectedPayload(reason) => assert_eq!(reason, "payload too large"),
        other => panic!("expected RejectedPayload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unsubscribe_removes_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let user_id = seed_subscribed_user(dir.path(), "ada@example.com");

    assert!(push_commands::unsubscribe(dir.path(), &user_id).unwrap());
    assert!(users::get_subscription(dir.path(), &user_id)
        .unwrap()
        .is_none());

    // Second call: nothing left to remove
    assert!(!push_commands::unsubscribe(dir.path(), &user_id).unwrap());

    // Unknown user is a NotFound error, not a silent false
    assert!(matches!(
        push_commands::unsubscribe(dir.path(), "ghost"),
        Err(CommandError::NotFound(_))
    ));
}
