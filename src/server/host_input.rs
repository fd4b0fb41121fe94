//! Host console input: a blocking readline thread bridged into the room.

use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::common::ui::PROMPT;

use super::command;
use super::domain::ParticipantId;
use super::state::RoomState;

/// Spawn the blocking readline thread for the host console and return the
/// receiving end of its input channel.
///
/// The channel closes when the host presses Ctrl+C or Ctrl+D on the prompt,
/// when readline fails, or when the receiver is dropped; the closed channel
/// is how the end of host input is observed.
pub fn spawn_host_input() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();

    // Spawn a blocking thread for rustyline (synchronous readline)
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Feed host console lines into the room until the input ends or the host
/// issues `/close`. Either way the room is closed on return.
///
/// `/close` is intercepted here and never reaches the command dispatcher;
/// every other line is processed exactly like a line from a connection,
/// with the host as issuer.
pub async fn run_host_input(state: Arc<RoomState>, mut input_rx: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = input_rx.recv().await {
        if line.split_whitespace().next() == Some("/close") {
            tracing::info!("Host requested to close the room");
            state.close_room().await;
            return;
        }
        command::process_line(&state, ParticipantId::Host, &line).await;
    }

    tracing::info!("Host input ended; closing the room");
    state.close_room().await;
}
