//! Server application state shared across handlers

use crate::push::NotificationDispatcher;
use crate::shutdown::ShutdownState;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared state for the server, holding the dispatcher and the storage
/// location every handler works against.
#[derive(Clone)]
pub struct ServerAppState {
    /// Push dispatcher holding the VAPID identity and transport
    pub dispatcher: Arc<NotificationDispatcher>,

    /// Directory holding users.json and the VAPID key file
    pub data_dir: Arc<PathBuf>,

    /// Shutdown state
    pub shutdown_state: ShutdownState,
}

impl ServerAppState {
    /// Create a new server application state
    pub fn new(
        dispatcher: NotificationDispatcher,
        data_dir: PathBuf,
        shutdown_state: ShutdownState,
    ) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            data_dir: Arc::new(data_dir),
            shutdown_state,
        }
    }
}
