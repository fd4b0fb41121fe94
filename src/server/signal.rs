//! Ctrl+C handling for the hosting process.

use std::sync::Arc;

use super::state::RoomState;

/// Wait for Ctrl+C and close the room when it arrives.
pub async fn watch_ctrl_c(state: Arc<RoomState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the Ctrl+C signal: {}", e);
        return;
    }
    tracing::info!("Ctrl+C received; closing the room");
    state.close_room().await;
}
