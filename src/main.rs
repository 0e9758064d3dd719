//! Pushbox server binary

use clap::Parser;
use pushbox_lib::file_storage::{ensure_dir, get_global_pushbox_dir};
use pushbox_lib::push::{NotificationDispatcher, VapidIdentity, WebPushTransport};
use pushbox_lib::server::{self, ServerAppState};
use pushbox_lib::shutdown::{self, ShutdownState};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pushbox", version, about = "Account and Web Push notification backend")]
struct Cli {
    /// Port to bind the server to
    #[arg(long, default_value_t = 3000, env = "PUSHBOX_PORT")]
    port: u16,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1", env = "PUSHBOX_BIND")]
    bind: String,

    /// Data directory for user records and VAPID keys (default: ~/.pushbox)
    #[arg(long, env = "PUSHBOX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Contact URI included in VAPID claims (mailto: or https:)
    #[arg(long, default_value = "mailto:admin@localhost", env = "PUSHBOX_CONTACT")]
    contact: String,

    /// Path to the VAPID key file (default: <data-dir>/vapid_keys.json)
    #[arg(long, env = "PUSHBOX_VAPID_KEYS")]
    vapid_keys: Option<PathBuf>,

    /// Comma-separated list of allowed CORS origins (default: any)
    #[arg(long, env = "PUSHBOX_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Option<Vec<String>>,
}

fn main() {
    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(get_global_pushbox_dir);
    if let Err(e) = ensure_dir(&data_dir) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let keys_path = cli
        .vapid_keys
        .unwrap_or_else(|| data_dir.join("vapid_keys.json"));

    // A valid VAPID identity is required before accepting any dispatch call
    let identity = match VapidIdentity::load_or_generate(&keys_path, &cli.contact) {
        Ok(identity) => identity,
        Err(e) => {
            log::error!("Invalid VAPID configuration: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let transport = match WebPushTransport::new() {
        Ok(transport) => transport,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let dispatcher = NotificationDispatcher::new(identity, transport);

    // Create the tokio runtime
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    rt.block_on(async {
        // Initialize shutdown state
        let shutdown_state = ShutdownState::new();
        if let Err(e) = shutdown::register_signal_handlers(shutdown_state.clone()) {
            log::warn!("Failed to register signal handlers: {}", e);
        }

        let state = ServerAppState::new(dispatcher, data_dir, shutdown_state);

        // Run the server
        if let Err(e) = server::run_server(cli.port, &cli.bind, state, cli.cors_origins).await {
            log::error!("Server failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    });
}
