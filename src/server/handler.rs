//! Per-connection task: socket read loop, writer task and room bookkeeping.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::common::time::get_jst_timestamp;

use super::command;
use super::domain::{ConnectionId, Participant, ParticipantId, Timestamp};
use super::formatter::MessageFormatter;
use super::registry::Outbox;
use super::state::RoomState;

/// Serve one accepted connection until it disconnects or the room closes.
///
/// The connection is registered on entry and unregistered on exit; its
/// outbox is drained onto the socket by a dedicated writer task so that
/// broadcasts never block on a slow peer.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    connection_id: ConnectionId,
    state: Arc<RoomState>,
) {
    let id = ParticipantId::Connection(connection_id);
    let (read_half, mut write_half) = stream.into_split();
    let (sender, mut receiver) = mpsc::unbounded_channel();

    // Register and announce under one lock so the welcome is queued before
    // any broadcast that follows it.
    {
        let mut registry = state.registry.lock().await;
        let participant =
            Participant::connection(connection_id, peer_addr, Timestamp::new(get_jst_timestamp()));
        let welcome = MessageFormatter::format_welcome(&participant.nickname);
        let entered =
            MessageFormatter::format_entered_notice(&participant.nickname, participant.connected_at);
        registry.register(id, participant, Outbox::Connection(sender));
        if let Err(e) = registry.send_to(id, &welcome) {
            tracing::warn!("Failed to send welcome to participant '{}': {}", id, e);
        }
        registry.broadcast(&entered, Some(id));
    }

    tracing::info!("Participant '{}' connected from {}", id, peer_addr);

    // Writer task: drains the outbox onto the socket, one line per message
    let writer_task = tokio::spawn(async move {
        while let Some(mut line) = receiver.recv().await {
            line.push('\n');
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut shutdown_rx = state.subscribe_shutdown();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            result = lines.next_line() => match result {
                Ok(Some(line)) => command::process_line(&state, id, &line).await,
                Ok(None) => {
                    tracing::info!("Participant '{}' disconnected", id);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Read error from participant '{}': {}", id, e);
                    break;
                }
            },
            _ = shutdown_rx.changed() => break,
        }
    }

    // Unregister before announcing so the leave notice cannot loop back to
    // the leaver. No notice once the room is closed; the farewell already
    // said goodbye.
    {
        let mut registry = state.registry.lock().await;
        if let Some(participant) = registry.unregister(id) {
            if !state.is_closed() {
                let left = MessageFormatter::format_left_notice(
                    &participant.nickname,
                    Timestamp::new(get_jst_timestamp()),
                );
                registry.broadcast(&left, None);
            }
            tracing::info!("Participant '{}' removed from the room", id);
        }
    }

    // Unregistering dropped the outbox sender, so the writer drains what is
    // queued and exits. Waiting on it flushes the socket before the halves
    // are dropped.
    let _ = writer_task.await;
}
