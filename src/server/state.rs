//! Shared room state: the registry behind a mutex and the closure signal.

use tokio::sync::{Mutex, watch};

use super::formatter::MessageFormatter;
use super::registry::Registry;

/// Shared state of the room.
///
/// Every connection task, the host input task and the signal watcher hold an
/// `Arc<RoomState>`.
pub struct RoomState {
    /// Participant registry; registration, broadcast and command handling
    /// all go through this lock
    pub registry: Mutex<Registry>,
    /// Closure flag, flipped to true exactly once when the room closes
    shutdown_tx: watch::Sender<bool>,
}

impl RoomState {
    /// Create the state for an open room
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            registry: Mutex::new(Registry::new()),
            shutdown_tx,
        }
    }

    /// Subscribe to the room closure signal
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Whether the room has been closed
    pub fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Close the room: broadcast the farewell to every participant and
    /// signal the accept loop and all connection tasks to stop.
    ///
    /// Idempotent; only the first call broadcasts. The registry lock is held
    /// across flag flip and broadcast, so the farewell reaches every outbox
    /// before any connection task can unregister itself.
    pub async fn close_room(&self) {
        let registry = self.registry.lock().await;
        if self.shutdown_tx.send_replace(true) {
            // Already closed
            return;
        }
        registry.broadcast(&MessageFormatter::format_closing_notice(), None);
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}
