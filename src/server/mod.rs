//! HTTP server exposing the account and push-notification API
//!
//! The server is glue: handlers look up subscriptions, invoke the
//! dispatcher, and translate delivery outcomes into HTTP responses.

pub mod routes;
pub mod state;

pub use state::ServerAppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Version information for the server
#[derive(serde::Serialize)]
struct VersionInfo {
    name: String,
    version: String,
}

/// Run the HTTP server
pub async fn run_server(
    port: u16,
    bind: &str,
    state: ServerAppState,
    cors_origins: Option<Vec<String>>,
) -> Result<(), String> {
    // Build CORS layer
    // Must be the outermost layer so preflight OPTIONS requests are
    // answered before routing
    // Note: Using explicit headers instead of Any to avoid browser
    // deprecation warnings when Authorization header is used with wildcard
    let cors = match &cors_origins {
        Some(origins) if !origins.is_empty() => {
            // Restricted CORS: only allow specified origins
            let allowed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        }
        _ => {
            // Permissive CORS: allow any origin (default for development)
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        }
    };

    let app = Router::new()
        .route("/api/auth/register", post(routes::register_handler))
        .route("/api/auth/login", post(routes::login_handler))
        .route("/api/auth/users", get(routes::users_handler))
        .route(
            "/api/push/vapid-public-key",
            get(routes::vapid_public_key_handler),
        )
        .route("/api/push/subscribe", post(routes::subscribe_handler))
        .route("/api/push/unsubscribe", post(routes::unsubscribe_handler))
        .route("/api/push/notify", post(routes::notify_handler))
        .route("/api/push/send", post(routes::notify_direct_handler))
        .route("/api/version", get(version_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state.clone());

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let cors_display = match &cors_origins {
        Some(origins) if !origins.is_empty() => origins.join(", "),
        _ => "*".to_string(),
    };

    println!("Pushbox server listening on http://{}", addr);
    println!("  CORS origins: {}", cors_display);
    println!("  VAPID public key: {}", state.dispatcher.identity().public_key());
    println!("  Data dir: {}", state.data_dir.display());

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    // Create shutdown signal that waits for the shutdown state flag
    let shutdown_state = state.shutdown_state.clone();
    let shutdown_signal = async move {
        loop {
            if shutdown_state.is_shutdown_requested() {
                log::info!("Shutdown signal received, stopping server...");
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Version endpoint - returns package name and version
async fn version_handler() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
