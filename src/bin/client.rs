//! Single-room TCP chat client.
//!
//! Connects to a chat room and bridges it to this console: arriving lines
//! are printed, typed lines are sent. `/quit` leaves the room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin client
//! cargo run --bin client -- --host 192.168.1.10 --port 3000
//! ```

use clap::Parser;

use chat_room_rs::client::run_client_session;
use chat_room_rs::common::endpoint::room_peer_addr;
use chat_room_rs::common::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Single-room TCP chat client", long_about = None)]
struct Args {
    /// IPv4 address of the hosting machine
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number the room listens on
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let addr = match room_peer_addr(&args.host, args.port) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid server address: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_client_session(addr).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
