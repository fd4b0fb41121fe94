//! Single-room TCP chat server.
//!
//! Hosts a chat room and takes part in it through this console: typed lines
//! are chat, `/`-prefixed lines are commands, `/close` closes the room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --port 3000 --nickname alice
//! ```

use clap::Parser;

use chat_room_rs::common::logger::setup_logger;
use chat_room_rs::server::{Nickname, run_server};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Single-room TCP chat server with a hosting console", long_about = None)]
struct Args {
    /// Port number to bind the room to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Nickname the host appears under
    #[arg(short = 'n', long, default_value = "host")]
    nickname: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let nickname = match Nickname::new(&args.nickname) {
        Ok(nickname) => nickname,
        Err(e) => {
            tracing::error!("Invalid host nickname: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server(args.port, nickname).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
