//! Single-room TCP chat.
//!
//! One process hosts a room over a TCP listening endpoint and takes part
//! through its console; other processes join as clients. Lines are chat
//! unless they start with `/`, in which case they are commands (`/nick`,
//! `/users`, `/help`, and the host-only `/close`).

pub mod client;
pub mod error;
pub mod server;

// shared library
pub mod common;
