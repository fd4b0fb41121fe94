//! Chat room client session: a receive loop printing room traffic and a
//! send loop feeding console lines onto the socket.

use std::net::SocketAddr;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::common::ui::{PROMPT, redisplay_prompt};
use crate::error::ClientError;

/// Command that ends the session locally; it is never sent to the room
const QUIT_COMMAND: &str = "/quit";

/// Run the chat room client session
///
/// Connects to the room at `addr`, then runs until the server closes the
/// connection or the user issues `/quit`.
pub async fn run_client_session(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let stream = match TcpStream::connect(addr).await {
        Ok(stream) => stream,
        Err(source) => {
            return Err(Box::new(ClientError::Connect { addr, source }));
        }
    };

    tracing::info!("Connected to the room at {}", addr);
    println!("Successfully connected to the room!");
    println!("You can start sending messages. Type '/quit' to exit.");

    let (read_half, mut write_half) = stream.into_split();

    // Spawn a task to print everything the room sends
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;
        let mut lines = BufReader::new(read_half).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    println!("{}", line);
                    redisplay_prompt();
                }
                Ok(None) => {
                    tracing::info!("Server closed the connection");
                    println!("Server disconnected.");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    connection_error = true;
                    break;
                }
            }
        }

        connection_error
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || {
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
                        if line == QUIT_COMMAND {
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

    // Spawn a task to forward input lines onto the socket. `/quit` ends the
    // session without being sent.
    let mut write_task = tokio::spawn(async move {
        let mut write_error = false;

        while let Some(mut line) = input_rx.recv().await {
            if line == QUIT_COMMAND {
                break;
            }

            line.push('\n');
            if let Err(e) = write_half.write_all(line.as_bytes()).await {
                tracing::warn!("Failed to send message: {}", e);
                write_error = true;
                break;
            }
        }

        write_error
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            let connection_error = read_result.unwrap_or(false);
            if connection_error {
                return Err(Box::new(ClientError::Connection(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            let write_error = write_result.unwrap_or(false);
            if write_error {
                return Err(Box::new(ClientError::Connection(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
