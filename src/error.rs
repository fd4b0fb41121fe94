//! Error types for the chat room server and client.

use std::net::SocketAddr;

use thiserror::Error;

use crate::common::endpoint::EndpointError;

/// Server-specific errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Opening the listen socket failed
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server address could not be built
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// Connecting to the room failed
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
}
