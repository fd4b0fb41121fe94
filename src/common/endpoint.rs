//! Socket address helpers shared by the server and client binaries.

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;

/// Error for endpoint construction
#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    /// The host string is not a valid IPv4 address
    #[error("'{0}' is not a valid IPv4 address")]
    InvalidAddress(String),
}

/// Build the wildcard listen address for a room on the given port.
///
/// The room accepts connections on every local interface.
pub fn room_listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Build the address of a remote room from an IPv4 host string and a port.
///
/// # Examples
///
/// ```
/// use chat_room_rs::common::endpoint::room_peer_addr;
///
/// let addr = room_peer_addr("127.0.0.1", 8080).unwrap();
/// assert_eq!(addr.to_string(), "127.0.0.1:8080");
/// ```
pub fn room_peer_addr(host: &str, port: u16) -> Result<SocketAddr, EndpointError> {
    let ip = host
        .parse::<Ipv4Addr>()
        .map_err(|_| EndpointError::InvalidAddress(host.to_string()))?;
    Ok(SocketAddr::from((ip, port)))
}
